pub mod address;
pub mod bip32;
pub mod curve;
pub mod error;
pub mod keys;
pub mod mnemonic;
pub mod path;
pub mod report;
pub mod seed;
pub mod xkey;

pub use address::{to_p2pkh, to_wif};
pub use bip32::{derive_master_key, ExtendedKey};
pub use curve::{CompressPoint, Curve, ScalarMul, Secp256k1};
pub use error::{KeyTreeError, Result};
pub use keys::{ChainCode, Fingerprint, PublicKey, SecretKey};
pub use mnemonic::{Entropy, Mnemonic, WordList};
pub use path::{ChildIndex, DerivationPath};
pub use report::{AddressEntry, ReportOptions, WalletReport};
pub use seed::Seed;
pub use xkey::KeyFamily;

/// Generate a mnemonic and its master key from raw entropy using BIP39 + BIP32.
pub fn gen_master_key(
    entropy: &Entropy,
    passphrase: &str,
    word_list: &WordList,
) -> Result<(Mnemonic, ExtendedKey)> {
    let mnemonic = Mnemonic::from_entropy(entropy, word_list);
    let seed = Seed::from_mnemonic(&mnemonic, passphrase);
    let master = derive_master_key(seed.as_bytes())?;
    Ok((mnemonic, master))
}
