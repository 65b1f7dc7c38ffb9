//! Pure hash functions and Base58Check encoding shared by the seedtree crates.

pub mod base58;
pub mod hash;

pub use base58::{check_decode, check_encode, CHECKSUM_LEN};
pub use hash::{hash160, hmac_sha512, ripemd160, sha256, sha256d, sha512};
