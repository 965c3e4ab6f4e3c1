//! Error type shared by every persistence path of the memory engine.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can arise while loading or persisting memory state.
///
/// A missing memory file is never an error; the store initialises itself
/// lazily.  Anything listed here means an existing file could not be used
/// and the operation was abandoned without touching the cached record.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("memory file {memory} exists but its key file {key} is missing")]
    KeyMissing { memory: PathBuf, key: PathBuf },
    #[error("key file {path} is invalid: {reason}")]
    InvalidKey { path: PathBuf, reason: String },
    #[error("memory file {path} cannot be decrypted: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    #[error("encryption failed: {0}")]
    Encrypt(String),
    #[error("memory record serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("conversation log {path} is unreadable: {reason}")]
    ConversationLog { path: PathBuf, reason: String },
    #[error("memory store lock poisoned")]
    Poisoned,
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}
