//! Elliptic-curve capabilities needed by child key derivation.
//!
//! The derivation engine only sees these traits, so the curve backend can be
//! swapped (or instrumented in tests) without touching the CKD logic.

use ibig::UBig;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::elliptic_curve::PrimeField;
use k256::{FieldBytes, ProjectivePoint, Scalar};

use crate::error::{KeyTreeError, Result};
use crate::keys::{PublicKey, SecretKey, PUBLIC_KEY_LEN, SECP256K1_ORDER};

/// Scalar arithmetic used to tweak a parent key by `IL`.
pub trait ScalarMul {
    /// `(tweak + secret) mod n`, or `None` when `tweak >= n` or the sum is zero.
    fn add_secret(&self, secret: &SecretKey, tweak: &[u8; 32]) -> Option<SecretKey>;

    /// `tweak·G + point`, or `None` when `tweak >= n` or the sum is the point at infinity.
    fn add_point(&self, point: &PublicKey, tweak: &[u8; 32]) -> Result<Option<PublicKey>>;
}

/// Public point derivation in compressed form.
pub trait CompressPoint {
    fn public_key(&self, secret: &SecretKey) -> Result<PublicKey>;
}

pub trait Curve: ScalarMul + CompressPoint {}

impl<T: ScalarMul + CompressPoint> Curve for T {}

/// secp256k1 backed by `k256` for point operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct Secp256k1;

impl ScalarMul for Secp256k1 {
    fn add_secret(&self, secret: &SecretKey, tweak: &[u8; 32]) -> Option<SecretKey> {
        let il = UBig::from_be_bytes(tweak);
        if il >= *SECP256K1_ORDER {
            return None;
        }
        let k = (il + UBig::from_be_bytes(secret.as_bytes())) % &*SECP256K1_ORDER;
        SecretKey::from_scalar(&k)
    }

    fn add_point(&self, point: &PublicKey, tweak: &[u8; 32]) -> Result<Option<PublicKey>> {
        let parent = k256::PublicKey::from_sec1_bytes(point.as_bytes())
            .map_err(|e| KeyTreeError::InvalidPublicKey(e.to_string()))?;
        let Some(il) = Option::<Scalar>::from(Scalar::from_repr(FieldBytes::from(*tweak))) else {
            return Ok(None);
        };
        let child = ProjectivePoint::GENERATOR * il + parent.to_projective();
        match k256::PublicKey::from_affine(child.to_affine()) {
            Ok(child) => Ok(Some(compress(&child))),
            Err(_) => Ok(None),
        }
    }
}

impl CompressPoint for Secp256k1 {
    fn public_key(&self, secret: &SecretKey) -> Result<PublicKey> {
        let secret = k256::SecretKey::from_slice(secret.as_bytes())
            .map_err(|_| KeyTreeError::ScalarOutOfRange)?;
        Ok(compress(&secret.public_key()))
    }
}

fn compress(point: &k256::PublicKey) -> PublicKey {
    let encoded = point.to_encoded_point(true);
    let mut bytes = [0u8; PUBLIC_KEY_LEN];
    bytes.copy_from_slice(encoded.as_bytes());
    PublicKey::from_compressed(bytes)
}
