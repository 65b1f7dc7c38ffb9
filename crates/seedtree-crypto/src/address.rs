use seedtree_primitives::{check_encode, hash160};
use zeroize::Zeroizing;

use crate::error::{KeyTreeError, Result};
use crate::keys::{PublicKey, SecretKey, PUBLIC_KEY_LEN, SECRET_KEY_LEN};

/// Mainnet pay-to-pubkey-hash version byte.
pub const P2PKH_VERSION: u8 = 0x00;
/// Mainnet WIF version byte.
pub const WIF_VERSION: u8 = 0x80;
/// Appended to WIF payloads whose public key is compressed.
pub const COMPRESSED_MARKER: u8 = 0x01;

/// P2PKH address of a 33-byte compressed public key.
pub fn to_p2pkh(pubkey: &[u8]) -> Result<String> {
    if pubkey.len() != PUBLIC_KEY_LEN {
        return Err(KeyTreeError::InvalidKeyLength {
            expected: PUBLIC_KEY_LEN,
            got: pubkey.len(),
        });
    }
    Ok(encode_p2pkh(&hash160(pubkey)))
}

/// Compressed Wallet Import Format of a 32-byte private key.
pub fn to_wif(privkey: &[u8]) -> Result<String> {
    if privkey.len() != SECRET_KEY_LEN {
        return Err(KeyTreeError::InvalidKeyLength {
            expected: SECRET_KEY_LEN,
            got: privkey.len(),
        });
    }
    Ok(encode_wif(privkey))
}

fn encode_p2pkh(key_hash: &[u8; 20]) -> String {
    let mut payload = [0u8; 21];
    payload[0] = P2PKH_VERSION;
    payload[1..].copy_from_slice(key_hash);
    check_encode(&payload)
}

fn encode_wif(privkey: &[u8]) -> String {
    let mut payload = Zeroizing::new([0u8; 34]);
    payload[0] = WIF_VERSION;
    payload[1..33].copy_from_slice(privkey);
    payload[33] = COMPRESSED_MARKER;
    check_encode(&payload[..])
}

impl PublicKey {
    pub fn to_p2pkh(&self) -> String {
        encode_p2pkh(&self.identifier())
    }
}

impl SecretKey {
    pub fn to_wif(&self) -> String {
        encode_wif(self.as_bytes())
    }
}
