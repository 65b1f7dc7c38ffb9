use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyTreeError {
    #[error("unsupported entropy length: {0} bits (expected 128, 160, 192, 224 or 256)")]
    InvalidEntropyLength(usize),
    #[error("invalid entropy character {found:?} at position {position}")]
    InvalidEntropyChars { position: usize, found: char },
    #[error("unsupported mnemonic length: {0} words")]
    InvalidWordCount(usize),
    #[error("word not in list: {0}")]
    UnknownWord(String),
    #[error("mnemonic checksum mismatch")]
    InvalidChecksum,
    #[error("word list unavailable: {0}")]
    WordListUnavailable(String),
    #[error("master key out of curve range, seed must be rejected")]
    InvalidMasterKey,
    #[error("scalar is zero or not below the curve order")]
    ScalarOutOfRange,
    #[error("no valid child key at or after index {0}")]
    InvalidChildIndex(u32),
    #[error("cannot derive hardened child {0} from a public key")]
    HardenedFromPublic(u32),
    #[error("extended key has no private key")]
    MissingPrivateKey,
    #[error("maximum derivation depth exceeded")]
    DepthOverflow,
    #[error("invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("invalid derivation path: {0}")]
    InvalidPath(String),
    #[error("failed to start derivation worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = KeyTreeError> = core::result::Result<T, E>;
