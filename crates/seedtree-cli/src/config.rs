//! Command-line flags and the optional TOML settings file.
//!
//! Explicit flags (or their `SEEDTREE_*` environment variables) win over the file,
//! the file wins over built-in defaults.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use seedtree_crypto::{DerivationPath, ReportOptions};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "seedtree", version, about = "BIP39 mnemonic and BIP32/44/84 keys from raw entropy")]
pub struct Cli {
    /// Entropy as a string of 0/1 characters (prompted for when absent)
    #[arg(long, env = "SEEDTREE_ENTROPY", conflicts_with = "mnemonic", hide_env_values = true)]
    pub entropy: Option<String>,

    /// Start from an existing mnemonic instead of entropy
    #[arg(long, env = "SEEDTREE_MNEMONIC", hide_env_values = true)]
    pub mnemonic: Option<String>,

    /// BIP39 passphrase mixed into the salt
    #[arg(long, env = "SEEDTREE_PASSPHRASE", hide_env_values = true)]
    pub passphrase: Option<String>,

    /// Word list file with 2048 lines (bundled English list by default)
    #[arg(long, env = "SEEDTREE_WORDLIST")]
    pub wordlist: Option<PathBuf>,

    /// Parent path of the listed addresses
    #[arg(long, env = "SEEDTREE_ACCOUNT_PATH")]
    pub account_path: Option<DerivationPath>,

    /// Number of addresses to list
    #[arg(long, env = "SEEDTREE_COUNT")]
    pub count: Option<u32>,

    #[arg(long, value_enum, env = "SEEDTREE_FORMAT")]
    pub format: Option<OutputFormat>,

    /// Log filter directive, e.g. `info` or `seedtree_crypto=trace`
    #[arg(long, env = "SEEDTREE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// TOML settings file
    #[arg(long, short = 'c', env = "SEEDTREE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Settings file contents. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub passphrase: Option<String>,
    pub wordlist: Option<PathBuf>,
    pub account_path: Option<DerivationPath>,
    pub count: Option<u32>,
    pub format: Option<OutputFormat>,
    pub log_level: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = toml::from_str(&contents)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }
}

/// Fully resolved run settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub passphrase: String,
    pub wordlist: Option<PathBuf>,
    pub report: ReportOptions,
    pub format: OutputFormat,
    pub log_level: String,
}

impl Settings {
    pub fn resolve(cli: &Cli) -> anyhow::Result<Self> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Ok(Self::merge(cli, file))
    }

    pub fn merge(cli: &Cli, file: FileConfig) -> Self {
        let defaults = ReportOptions::default();
        Settings {
            passphrase: cli.passphrase.clone().or(file.passphrase).unwrap_or_default(),
            wordlist: cli.wordlist.clone().or(file.wordlist),
            report: ReportOptions {
                account_path: cli
                    .account_path
                    .clone()
                    .or(file.account_path)
                    .unwrap_or(defaults.account_path),
                address_count: cli.count.or(file.count).unwrap_or(defaults.address_count),
            },
            format: cli.format.or(file.format).unwrap_or_default(),
            log_level: cli
                .log_level
                .clone()
                .or(file.log_level)
                .unwrap_or_else(|| "warn".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("seedtree").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::merge(&parse(&[]), FileConfig::default());
        assert_eq!(settings.passphrase, "");
        assert_eq!(settings.report, ReportOptions::default());
        assert_eq!(settings.format, OutputFormat::Text);
        assert_eq!(settings.log_level, "warn");
        assert!(settings.wordlist.is_none());
    }

    #[test]
    fn test_flags_override_file() {
        let file: FileConfig = toml::from_str(
            r#"
            passphrase = "from-file"
            account_path = "m/84'/0'/0'/0"
            count = 2
            format = "json"
            "#,
        )
        .unwrap();
        let cli = parse(&["--passphrase", "from-flag", "--count", "7"]);
        let settings = Settings::merge(&cli, file);

        assert_eq!(settings.passphrase, "from-flag");
        assert_eq!(settings.report.address_count, 7);
        assert_eq!(settings.report.account_path.to_string(), "m/84'/0'/0'/0");
        assert_eq!(settings.format, OutputFormat::Json);
    }

    #[test]
    fn test_flag_parsing() {
        let cli = parse(&["--account-path", "m/44h/1h/0h/1", "--format", "json"]);
        assert_eq!(cli.account_path.unwrap().to_string(), "m/44'/1'/0'/1");
        assert_eq!(cli.format, Some(OutputFormat::Json));

        assert!(Cli::try_parse_from(["seedtree", "--account-path", "44/0"]).is_err());
        assert!(Cli::try_parse_from(["seedtree", "--entropy", "01", "--mnemonic", "abandon"]).is_err());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("seedtree.toml");
        let config = FileConfig {
            count: Some(3),
            log_level: Some("debug".to_string()),
            ..FileConfig::default()
        };
        std::fs::write(&path, toml::to_string(&config).unwrap()).unwrap();

        assert_eq!(FileConfig::load(&path).unwrap(), config);
        assert!(FileConfig::load(&dir.path().join("missing.toml")).is_err());

        std::fs::write(&path, "colour = \"red\"").unwrap();
        assert!(FileConfig::load(&path).is_err());
    }
}
