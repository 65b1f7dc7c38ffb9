use core::fmt;

use ibig::UBig;
use once_cell::sync::Lazy;
use seedtree_primitives::hash160;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{KeyTreeError, Result};

pub const SECRET_KEY_LEN: usize = 32;
pub const PUBLIC_KEY_LEN: usize = 33;
pub const CHAIN_CODE_LEN: usize = 32;

/// Order `n` of the secp256k1 base point.
pub static SECP256K1_ORDER: Lazy<UBig> = Lazy::new(|| {
    UBig::from_str_radix(
        "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141",
        16,
    )
    .expect("curve order is valid hex")
});

pub type Fingerprint = [u8; 4];

/// A private scalar in `[1, n-1]`, stored big-endian.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; SECRET_KEY_LEN]);

impl SecretKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SECRET_KEY_LEN {
            return Err(KeyTreeError::InvalidKeyLength {
                expected: SECRET_KEY_LEN,
                got: bytes.len(),
            });
        }
        Self::from_scalar(&UBig::from_be_bytes(bytes)).ok_or(KeyTreeError::ScalarOutOfRange)
    }

    /// Returns `None` when the scalar is zero or not below the curve order.
    pub(crate) fn from_scalar(k: &UBig) -> Option<Self> {
        if *k == UBig::from(0u64) || *k >= *SECP256K1_ORDER {
            return None;
        }
        let bytes = k.to_be_bytes();
        let mut arr = [0u8; SECRET_KEY_LEN];
        arr[SECRET_KEY_LEN - bytes.len()..].copy_from_slice(&bytes);
        Some(SecretKey(arr))
    }

    pub fn as_bytes(&self) -> &[u8; SECRET_KEY_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

/// A compressed secp256k1 point (`0x02`/`0x03` prefix followed by X).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; PUBLIC_KEY_LEN]);

impl PublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PUBLIC_KEY_LEN {
            return Err(KeyTreeError::InvalidKeyLength {
                expected: PUBLIC_KEY_LEN,
                got: bytes.len(),
            });
        }
        k256::PublicKey::from_sec1_bytes(bytes)
            .map_err(|e| KeyTreeError::InvalidPublicKey(e.to_string()))?;
        let mut arr = [0u8; PUBLIC_KEY_LEN];
        arr.copy_from_slice(bytes);
        Ok(PublicKey(arr))
    }

    /// Wraps bytes already produced by the curve implementation.
    pub(crate) fn from_compressed(bytes: [u8; PUBLIC_KEY_LEN]) -> Self {
        PublicKey(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }

    /// HASH160 of the compressed encoding.
    pub fn identifier(&self) -> [u8; 20] {
        hash160(&self.0)
    }

    pub fn fingerprint(&self) -> Fingerprint {
        let id = self.identifier();
        [id[0], id[1], id[2], id[3]]
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ChainCode([u8; CHAIN_CODE_LEN]);

impl ChainCode {
    pub fn new(bytes: [u8; CHAIN_CODE_LEN]) -> Self {
        ChainCode(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; CHAIN_CODE_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for ChainCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ChainCode(..)")
    }
}
