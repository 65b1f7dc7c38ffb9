use core::fmt;
use std::collections::HashMap;
use std::path::Path;

use bitvec::prelude::*;
use seedtree_primitives::sha256;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{KeyTreeError, Result};

/// Number of entries in a BIP39 word list.
pub const WORD_LIST_LEN: usize = 2048;

const BITS_PER_WORD: usize = 11;
const SUPPORTED_ENTROPY_BITS: [usize; 5] = [128, 160, 192, 224, 256];

fn check_entropy_bits(bits: usize) -> Result<()> {
    if SUPPORTED_ENTROPY_BITS.contains(&bits) {
        Ok(())
    } else {
        Err(KeyTreeError::InvalidEntropyLength(bits))
    }
}

/// Raw BIP39 entropy of a supported length.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Entropy(Vec<u8>);

impl Entropy {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        check_entropy_bits(bytes.len() * 8)?;
        Ok(Entropy(bytes.to_vec()))
    }

    /// Parse a string of `'0'`/`'1'` characters, most significant bit first.
    pub fn from_bit_str(bits: &str) -> Result<Self> {
        if let Some((position, found)) = bits.chars().enumerate().find(|(_, c)| !matches!(c, '0' | '1')) {
            return Err(KeyTreeError::InvalidEntropyChars { position, found });
        }
        check_entropy_bits(bits.len())?;

        let mut bytes = vec![0u8; bits.len() / 8];
        let view = bytes.view_bits_mut::<Msb0>();
        for (i, c) in bits.bytes().enumerate() {
            view.set(i, c == b'1');
        }
        Ok(Entropy(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn bits(&self) -> usize {
        self.0.len() * 8
    }

    pub fn to_bit_string(&self) -> String {
        self.0
            .view_bits::<Msb0>()
            .iter()
            .map(|bit| if *bit { '1' } else { '0' })
            .collect()
    }
}

impl fmt::Debug for Entropy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entropy({} bits)", self.bits())
    }
}

/// An ordered list of exactly 2048 distinct words.
#[derive(Clone)]
pub struct WordList {
    words: Vec<String>,
    index: HashMap<String, u16>,
}

impl WordList {
    /// The English list bundled with the `bip39` crate.
    pub fn english() -> Self {
        let words = bip39::Language::English
            .word_list()
            .iter()
            .map(|w| w.to_string())
            .collect();
        Self::build(words)
    }

    /// One word per line; surrounding whitespace and blank lines are ignored.
    pub fn parse(text: &str) -> Result<Self> {
        let words: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        if words.len() != WORD_LIST_LEN {
            return Err(KeyTreeError::WordListUnavailable(format!(
                "expected {WORD_LIST_LEN} words, found {}",
                words.len()
            )));
        }
        let list = Self::build(words);
        if list.index.len() != WORD_LIST_LEN {
            return Err(KeyTreeError::WordListUnavailable(
                "word list contains duplicates".to_string(),
            ));
        }
        Ok(list)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            KeyTreeError::WordListUnavailable(format!("{}: {e}", path.display()))
        })?;
        let list = Self::parse(&text)?;
        debug!(path = %path.display(), "loaded word list");
        Ok(list)
    }

    fn build(words: Vec<String>) -> Self {
        let index = words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i as u16))
            .collect();
        WordList { words, index }
    }

    /// Panics if `index` is not below 2048.
    pub fn word(&self, index: u16) -> &str {
        &self.words[index as usize]
    }

    pub fn index_of(&self, word: &str) -> Option<u16> {
        self.index.get(word).copied()
    }
}

impl fmt::Debug for WordList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WordList({} .. {})", self.words[0], self.words[WORD_LIST_LEN - 1])
    }
}

/// A BIP39 phrase: words separated by single spaces.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Mnemonic {
    phrase: String,
}

impl Mnemonic {
    /// Encode entropy plus its SHA-256 checksum bits as 11-bit word indices.
    pub fn from_entropy(entropy: &Entropy, word_list: &WordList) -> Self {
        let entropy_bits = entropy.bits();
        let checksum_bits = entropy_bits / 32;

        // at most 8 checksum bits, so the first digest byte is enough
        let mut data = Zeroizing::new(entropy.as_bytes().to_vec());
        data.push(sha256(entropy.as_bytes())[0]);

        let stream = &data.view_bits::<Msb0>()[..entropy_bits + checksum_bits];
        let phrase = stream
            .chunks_exact(BITS_PER_WORD)
            .map(|group| word_list.word(group.load_be::<u16>()))
            .collect::<Vec<_>>()
            .join(" ");
        Mnemonic { phrase }
    }

    pub fn from_entropy_bytes(entropy: &[u8], word_list: &WordList) -> Result<Self> {
        Ok(Self::from_entropy(&Entropy::from_bytes(entropy)?, word_list))
    }

    /// Validate a phrase against the list and its checksum.
    pub fn parse(phrase: &str, word_list: &WordList) -> Result<Self> {
        let entropy = decode(phrase, word_list)?;
        Ok(Self::from_entropy(&entropy, word_list))
    }

    pub fn to_entropy(&self, word_list: &WordList) -> Result<Entropy> {
        decode(&self.phrase, word_list)
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.phrase.split(' ')
    }

    pub fn word_count(&self) -> usize {
        self.words().count()
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.phrase)
    }
}

impl fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mnemonic({} words)", self.word_count())
    }
}

fn decode(phrase: &str, word_list: &WordList) -> Result<Entropy> {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    let total_bits = words.len() * BITS_PER_WORD;
    let entropy_bits = total_bits * 32 / 33;
    if total_bits % 33 != 0 || check_entropy_bits(entropy_bits).is_err() {
        return Err(KeyTreeError::InvalidWordCount(words.len()));
    }

    let mut data = Zeroizing::new(vec![0u8; total_bits.div_ceil(8)]);
    {
        let stream = data.view_bits_mut::<Msb0>();
        for (i, word) in words.iter().enumerate() {
            let index = word_list
                .index_of(word)
                .ok_or_else(|| KeyTreeError::UnknownWord(word.to_string()))?;
            stream[i * BITS_PER_WORD..(i + 1) * BITS_PER_WORD].store_be(index);
        }
    }

    let entropy = Entropy(data[..entropy_bits / 8].to_vec());
    let digest = sha256(entropy.as_bytes());
    let expected = &digest.view_bits::<Msb0>()[..entropy_bits / 32];
    let actual = &data.view_bits::<Msb0>()[entropy_bits..total_bits];
    if expected != actual {
        return Err(KeyTreeError::InvalidChecksum);
    }
    Ok(entropy)
}
