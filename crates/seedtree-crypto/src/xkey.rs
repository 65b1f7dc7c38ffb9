//! Base58Check serialization of extended keys (BIP32 xprv/xpub, BIP84 zprv/zpub).

use serde::{Deserialize, Serialize};
use seedtree_primitives::check_encode;
use zeroize::Zeroizing;

use crate::bip32::ExtendedKey;
use crate::error::{KeyTreeError, Result};
use crate::keys::{Fingerprint, PUBLIC_KEY_LEN};

/// Length of the serialized payload before the checksum.
pub const SERIALIZED_LEN: usize = 78;

pub const XPRV_VERSION: [u8; 4] = [0x04, 0x88, 0xad, 0xe4];
pub const XPUB_VERSION: [u8; 4] = [0x04, 0x88, 0xb2, 0x1e];
pub const ZPRV_VERSION: [u8; 4] = [0x04, 0xb2, 0x43, 0x0c];
pub const ZPUB_VERSION: [u8; 4] = [0x04, 0xb2, 0x47, 0x46];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyFamily {
    /// Legacy BIP32/BIP44 keys: xprv/xpub.
    Bip32,
    /// Native segwit BIP84 keys: zprv/zpub.
    Bip84,
}

impl KeyFamily {
    pub const fn private_version(self) -> [u8; 4] {
        match self {
            KeyFamily::Bip32 => XPRV_VERSION,
            KeyFamily::Bip84 => ZPRV_VERSION,
        }
    }

    pub const fn public_version(self) -> [u8; 4] {
        match self {
            KeyFamily::Bip32 => XPUB_VERSION,
            KeyFamily::Bip84 => ZPUB_VERSION,
        }
    }
}

/// `version ‖ depth ‖ parent fingerprint ‖ ser32(index) ‖ chain code ‖ key`, Base58Check encoded.
///
/// `key_material` is `0x00 ‖ k` for private keys or the compressed point for public keys.
pub fn serialize(
    version: [u8; 4],
    depth: u8,
    parent_fingerprint: Fingerprint,
    child_index: u32,
    chain_code: &[u8; 32],
    key_material: &[u8; PUBLIC_KEY_LEN],
) -> String {
    let mut data = Zeroizing::new([0u8; SERIALIZED_LEN]);
    data[0..4].copy_from_slice(&version);
    data[4] = depth;
    data[5..9].copy_from_slice(&parent_fingerprint);
    data[9..13].copy_from_slice(&child_index.to_be_bytes());
    data[13..45].copy_from_slice(chain_code);
    data[45..78].copy_from_slice(key_material);
    check_encode(&data[..])
}

impl ExtendedKey {
    pub fn to_extended_private(&self, family: KeyFamily) -> Result<String> {
        let private_key = self.private_key().ok_or(KeyTreeError::MissingPrivateKey)?;
        let mut material = Zeroizing::new([0u8; PUBLIC_KEY_LEN]);
        material[1..].copy_from_slice(private_key.as_bytes());
        Ok(self.serialize_with(family.private_version(), &material))
    }

    pub fn to_extended_public(&self, family: KeyFamily) -> String {
        self.serialize_with(family.public_version(), self.public_key().as_bytes())
    }

    pub fn to_xprv(&self) -> Result<String> {
        self.to_extended_private(KeyFamily::Bip32)
    }

    pub fn to_xpub(&self) -> String {
        self.to_extended_public(KeyFamily::Bip32)
    }

    pub fn to_zprv(&self) -> Result<String> {
        self.to_extended_private(KeyFamily::Bip84)
    }

    pub fn to_zpub(&self) -> String {
        self.to_extended_public(KeyFamily::Bip84)
    }

    fn serialize_with(&self, version: [u8; 4], key_material: &[u8; PUBLIC_KEY_LEN]) -> String {
        serialize(
            version,
            self.depth(),
            self.parent_fingerprint(),
            self.child_index().raw(),
            self.chain_code().as_bytes(),
            key_material,
        )
    }
}
