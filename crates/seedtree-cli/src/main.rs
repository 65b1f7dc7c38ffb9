//! seedtree: derive a BIP39 mnemonic, BIP32 root keys and BIP44 addresses from entropy.

mod config;
mod input;
mod output;
mod telemetry;

use anyhow::Context;
use clap::Parser;
use seedtree_crypto::{Entropy, Mnemonic, WalletReport, WordList};
use tracing::info;
use zeroize::Zeroize;

use crate::config::{Cli, OutputFormat, Settings};

fn main() -> anyhow::Result<()> {
    let mut cli = Cli::parse();
    let settings = Settings::resolve(&cli)?;
    telemetry::init_telemetry(&settings.log_level, settings.format == OutputFormat::Json)?;

    let word_list = match &settings.wordlist {
        Some(path) => WordList::load(path)
            .with_context(|| format!("loading word list {}", path.display()))?,
        None => WordList::english(),
    };

    let mnemonic = match (cli.mnemonic.take(), cli.entropy.take()) {
        (Some(mut phrase), _) => {
            let parsed = Mnemonic::parse(&phrase, &word_list).context("parsing mnemonic");
            phrase.zeroize();
            parsed?
        }
        (None, Some(mut bits)) => {
            let entropy = Entropy::from_bit_str(bits.trim()).context("parsing entropy");
            bits.zeroize();
            Mnemonic::from_entropy(&entropy?, &word_list)
        }
        (None, None) => {
            let entropy = input::prompt_entropy(std::io::stdin().lock(), std::io::stderr())?;
            Mnemonic::from_entropy(&entropy, &word_list)
        }
    };
    info!(words = mnemonic.word_count(), "mnemonic ready");

    let report = WalletReport::from_mnemonic(&mnemonic, &settings.passphrase, &settings.report)
        .with_context(|| format!("deriving keys under {}", settings.report.account_path))?;
    print!("{}", output::render(&report, settings.format)?);
    Ok(())
}
