//! Plaintext conversation log for human inspection.
//!
//! Independent of the encrypted record: a pretty-printed JSON array of
//! `{ "user", "catia", "at" }` objects.  Each append reads the whole file,
//! pushes one entry and rewrites it.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cipher::write_atomic;
use crate::error::StorageError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedExchange {
    pub user: String,
    pub catia: String,
    /// Wall-clock time the exchange was recorded.
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ConversationLog {
    path: PathBuf,
}

impl ConversationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every logged exchange, oldest first.  A missing file is an empty log.
    pub fn load(&self) -> Result<Vec<LoggedExchange>, StorageError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(&self.path, e)),
        };
        serde_json::from_slice(&raw).map_err(|e| StorageError::ConversationLog {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    pub fn append(&self, user: &str, catia: &str) -> Result<(), StorageError> {
        let mut entries = self.load()?;
        entries.push(LoggedExchange {
            user: user.to_string(),
            catia: catia.to_string(),
            at: Utc::now(),
        });
        let payload = serde_json::to_vec_pretty(&entries)?;
        write_atomic(&self.path, &payload)
    }
}
