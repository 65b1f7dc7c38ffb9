use core::fmt;

use pbkdf2::pbkdf2_hmac;
use sha2::Sha512;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::mnemonic::Mnemonic;

pub const SALT_PREFIX: &str = "mnemonic";
pub const PBKDF2_ROUNDS: u32 = 2048;
pub const SEED_LEN: usize = 64;

/// The PBKDF2 salt for a passphrase: `"mnemonic" ‖ passphrase`.
pub fn salt(passphrase: &str) -> String {
    format!("{SALT_PREFIX}{passphrase}")
}

/// 64-byte BIP39 root seed.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Seed([u8; SEED_LEN]);

impl Seed {
    pub fn from_mnemonic(mnemonic: &Mnemonic, passphrase: &str) -> Self {
        Self::stretch(mnemonic.phrase(), passphrase)
    }

    /// PBKDF2-HMAC-SHA512 over the phrase bytes. The phrase is not validated here.
    pub fn stretch(phrase: &str, passphrase: &str) -> Self {
        let salt = Zeroizing::new(salt(passphrase));
        let mut seed = [0u8; SEED_LEN];
        pbkdf2_hmac::<Sha512>(phrase.as_bytes(), salt.as_bytes(), PBKDF2_ROUNDS, &mut seed);
        Seed(seed)
    }

    pub fn as_bytes(&self) -> &[u8; SEED_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Seed(..)")
    }
}
