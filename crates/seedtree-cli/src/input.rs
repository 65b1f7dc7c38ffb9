//! Interactive entropy entry.

use std::io::{BufRead, Write};

use anyhow::{bail, Context};
use seedtree_crypto::{Entropy, KeyTreeError};
use tracing::debug;
use zeroize::Zeroizing;

const PROMPT: &str = "Enter entropy as 128, 160, 192, 224 or 256 characters of 0 and 1:";

/// Prompt on `output` until `input` yields a valid bit string.
///
/// Only malformed entropy is re-prompted; end of input or an I/O failure aborts.
pub fn prompt_entropy<R: BufRead, W: Write>(mut input: R, mut output: W) -> anyhow::Result<Entropy> {
    loop {
        writeln!(output, "{PROMPT}")?;
        output.flush()?;

        let mut line = Zeroizing::new(String::new());
        let read = input.read_line(&mut line).context("reading entropy")?;
        if read == 0 {
            bail!("no entropy entered");
        }

        match Entropy::from_bit_str(line.trim()) {
            Ok(entropy) => return Ok(entropy),
            Err(e @ (KeyTreeError::InvalidEntropyLength(_) | KeyTreeError::InvalidEntropyChars { .. })) => {
                debug!(error = %e, "rejected entropy input");
                writeln!(output, "Invalid input: {e}")?;
            }
            Err(e) => return Err(e.into()),
        }
    }
}
