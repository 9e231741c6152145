use log::warn;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors raised while building, loading or persisting a key index.
///
/// A lookup miss is not an error: `KeyIndex::lookup` returns `None`.
#[derive(Error, Debug)]
pub enum IndexError {
    /// key rejected by the builder (empty in strict mode, or not representable
    /// in the index text encoding)
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("index has no records")]
    EmptyIndex,

    /// persisted bytes failed structural validation
    #[error("corrupt index: {0}")]
    CorruptIndex(String),

    #[error("out of memory while building index ({requested} bytes requested)")]
    OutOfMemory { requested: usize },

    #[error("invalid index options: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl IndexError {
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        IndexError::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn corrupt(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        warn!("rejecting index bytes: {}", reason);
        IndexError::CorruptIndex(reason)
    }
}
