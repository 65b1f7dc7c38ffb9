use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::KeyTreeError;

pub const HARDENED_BIT: u32 = 1 << 31;

/// A BIP32 child number; the top bit marks hardened derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChildIndex(u32);

impl ChildIndex {
    pub fn normal(index: u32) -> Result<Self, KeyTreeError> {
        if index & HARDENED_BIT != 0 {
            return Err(KeyTreeError::InvalidPath(format!(
                "index {index} out of range"
            )));
        }
        Ok(ChildIndex(index))
    }

    pub fn hardened(index: u32) -> Result<Self, KeyTreeError> {
        Self::normal(index).map(|c| ChildIndex(c.0 | HARDENED_BIT))
    }

    pub const fn from_raw(raw: u32) -> Self {
        ChildIndex(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn is_hardened(self) -> bool {
        self.0 & HARDENED_BIT != 0
    }

    /// The index without the hardened bit.
    pub const fn number(self) -> u32 {
        self.0 & !HARDENED_BIT
    }

    /// The following index of the same kind, if any.
    pub fn next(self) -> Option<Self> {
        let next = self.0.checked_add(1)?;
        if (next & HARDENED_BIT) != (self.0 & HARDENED_BIT) {
            return None;
        }
        Some(ChildIndex(next))
    }
}

impl From<u32> for ChildIndex {
    fn from(raw: u32) -> Self {
        ChildIndex(raw)
    }
}

impl fmt::Display for ChildIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_hardened() {
            write!(f, "{}'", self.number())
        } else {
            write!(f, "{}", self.number())
        }
    }
}

impl FromStr for ChildIndex {
    type Err = KeyTreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (digits, hardened) = match s.strip_suffix(['\'', 'h', 'H']) {
            Some(digits) => (digits, true),
            None => (s, false),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(KeyTreeError::InvalidPath(format!("invalid child index {s:?}")));
        }
        let index: u32 = digits
            .parse()
            .map_err(|_| KeyTreeError::InvalidPath(format!("child index {s:?} out of range")))?;
        if hardened {
            Self::hardened(index)
        } else {
            Self::normal(index)
        }
    }
}

/// An ordered list of child indices, written `m/44'/0'/0'/0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DerivationPath(Vec<ChildIndex>);

impl DerivationPath {
    pub fn master() -> Self {
        DerivationPath(Vec::new())
    }

    /// `m/44'/coin'/account'/change`, the parent of BIP44 receive or change addresses.
    pub fn bip44(coin: u32, account: u32, change: u32) -> Result<Self, KeyTreeError> {
        Ok(DerivationPath(vec![
            ChildIndex::hardened(44)?,
            ChildIndex::hardened(coin)?,
            ChildIndex::hardened(account)?,
            ChildIndex::normal(change)?,
        ]))
    }

    pub fn child(&self, index: ChildIndex) -> Self {
        let mut path = self.0.clone();
        path.push(index);
        DerivationPath(path)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, ChildIndex> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[ChildIndex] {
        &self.0
    }
}

impl From<Vec<ChildIndex>> for DerivationPath {
    fn from(path: Vec<ChildIndex>) -> Self {
        DerivationPath(path)
    }
}

impl FromIterator<ChildIndex> for DerivationPath {
    fn from_iter<I: IntoIterator<Item = ChildIndex>>(iter: I) -> Self {
        DerivationPath(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a DerivationPath {
    type Item = &'a ChildIndex;
    type IntoIter = core::slice::Iter<'a, ChildIndex>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for index in &self.0 {
            write!(f, "/{index}")?;
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = KeyTreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('/');
        if parts.next() != Some("m") {
            return Err(KeyTreeError::InvalidPath(format!(
                "{s:?} must start with \"m\""
            )));
        }
        parts.map(ChildIndex::from_str).collect()
    }
}

// Paths travel through config files as their textual form.
impl Serialize for DerivationPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DerivationPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
