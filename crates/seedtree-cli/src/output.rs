//! Report rendering.

use std::fmt::Write;

use seedtree_crypto::WalletReport;

use crate::config::OutputFormat;

pub fn render(report: &WalletReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(report)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
    }
}

/// Human-readable report, one section per derivation stage.
pub fn render_text(report: &WalletReport) -> String {
    let mut out = String::new();
    // writing into a String cannot fail
    let _ = write_text(&mut out, report);
    out
}

fn write_text(out: &mut String, report: &WalletReport) -> std::fmt::Result {
    writeln!(out, "Mnemonic: {}", report.mnemonic)?;

    writeln!(out)?;
    writeln!(out, "Passphrase: {}", report.passphrase)?;
    writeln!(out, "Salt: {}", report.salt)?;

    writeln!(out)?;
    writeln!(out, "[PBKDF2-HMAC-SHA512] seed from mnemonic and salt")?;
    writeln!(out, "Seed (64 bytes): {}", report.seed)?;

    writeln!(out)?;
    writeln!(out, "[HMAC-SHA512 \"Bitcoin seed\"] master key and chain code")?;
    writeln!(out, "Master private key: {}", report.master_private_key)?;
    writeln!(out, "Master chain code: {}", report.master_chain_code)?;
    writeln!(out, "Fingerprint: {}", report.root_fingerprint)?;

    writeln!(out)?;
    writeln!(out, "BIP32 root extended keys")?;
    writeln!(out, "xprv: {}", report.root_xprv)?;
    writeln!(out, "xpub: {}", report.root_xpub)?;

    writeln!(out)?;
    writeln!(out, "P2PKH addresses and compressed WIF keys: {}/i", report.account_path)?;
    writeln!(out, "Account xpub: {}", report.account_xpub)?;
    for entry in &report.addresses {
        writeln!(out, " - {}: {}", entry.index, entry.address)?;
        writeln!(out, "   WIF: {}", entry.wif)?;
    }

    writeln!(out)?;
    writeln!(out, "BIP84 root extended keys")?;
    writeln!(out, "zprv: {}", report.root_zprv)?;
    writeln!(out, "zpub: {}", report.root_zpub)?;
    Ok(())
}
