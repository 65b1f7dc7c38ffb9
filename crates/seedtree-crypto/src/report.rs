use serde::{Deserialize, Serialize};
use tracing::{debug, info_span};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::bip32::derive_master_key;
use crate::error::{KeyTreeError, Result};
use crate::mnemonic::{Entropy, Mnemonic, WordList};
use crate::path::{ChildIndex, DerivationPath, HARDENED_BIT};
use crate::seed::{salt, Seed};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportOptions {
    /// Parent of the listed addresses.
    pub account_path: DerivationPath,
    pub address_count: u32,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            account_path: DerivationPath::from(vec![
                ChildIndex::from_raw(44 | HARDENED_BIT),
                ChildIndex::from_raw(HARDENED_BIT),
                ChildIndex::from_raw(HARDENED_BIT),
                ChildIndex::from_raw(0),
            ]),
            address_count: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Zeroize, ZeroizeOnDrop)]
pub struct AddressEntry {
    pub index: u32,
    pub path: String,
    pub address: String,
    pub wif: String,
}

/// Everything derived from one entropy input, rendered as display strings.
#[derive(Debug, Clone, Serialize, Zeroize, ZeroizeOnDrop)]
pub struct WalletReport {
    pub mnemonic: String,
    pub passphrase: String,
    pub salt: String,
    pub seed: String,
    pub master_private_key: String,
    pub master_chain_code: String,
    pub root_fingerprint: String,
    pub root_xprv: String,
    pub root_xpub: String,
    pub account_path: String,
    pub account_xpub: String,
    pub addresses: Vec<AddressEntry>,
    pub root_zprv: String,
    pub root_zpub: String,
}

impl WalletReport {
    pub fn generate(
        entropy: &Entropy,
        passphrase: &str,
        word_list: &WordList,
        options: &ReportOptions,
    ) -> Result<Self> {
        let mnemonic = Mnemonic::from_entropy(entropy, word_list);
        debug!(words = mnemonic.word_count(), "encoded mnemonic");
        Self::from_mnemonic(&mnemonic, passphrase, options)
    }

    pub fn from_mnemonic(
        mnemonic: &Mnemonic,
        passphrase: &str,
        options: &ReportOptions,
    ) -> Result<Self> {
        let _span = info_span!("wallet_report", account = %options.account_path).entered();

        let seed = Seed::from_mnemonic(mnemonic, passphrase);
        let master = derive_master_key(seed.as_bytes())?;
        let master_private_key = master
            .private_key()
            .ok_or(KeyTreeError::MissingPrivateKey)?;

        let account = master.derive_path(&options.account_path)?;
        let addresses = account
            .derive_run(ChildIndex::from_raw(0), options.address_count)?
            .iter()
            .map(|child| {
                let private_key = child.private_key().ok_or(KeyTreeError::MissingPrivateKey)?;
                Ok(AddressEntry {
                    index: child.child_index().raw(),
                    path: options.account_path.child(child.child_index()).to_string(),
                    address: child.public_key().to_p2pkh(),
                    wif: private_key.to_wif(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(count = addresses.len(), "derived addresses");

        Ok(WalletReport {
            mnemonic: mnemonic.phrase().to_string(),
            passphrase: passphrase.to_string(),
            salt: salt(passphrase),
            seed: seed.to_hex(),
            master_private_key: master_private_key.to_hex(),
            master_chain_code: master.chain_code().to_hex(),
            root_fingerprint: hex::encode(master.fingerprint()),
            root_xprv: master.to_xprv()?,
            root_xpub: master.to_xpub(),
            account_path: options.account_path.to_string(),
            account_xpub: account.to_xpub(),
            addresses,
            root_zprv: master.to_zprv()?,
            root_zpub: master.to_zpub(),
        })
    }
}
