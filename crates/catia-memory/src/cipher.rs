//! Cipher Store – authenticated encryption of a single blob on disk.
//!
//! The memory record is serialized by the caller and handed to
//! [`CipherStore::save`] as opaque bytes.  They are sealed with AES-256-GCM
//! and written atomically, so a reader only ever observes the previous or the
//! new file, never a torn one.
//!
//! # File layout
//!
//! | file        | content                                              |
//! |-------------|------------------------------------------------------|
//! | key file    | base64 of the 32-byte AES key, owner read/write only |
//! | memory file | 12-byte random nonce ‖ ciphertext ‖ 16-byte GCM tag  |
//!
//! The key is generated on first open and never rotated.  If the memory file
//! survives but the key does not, [`CipherStore::open`] refuses to mint a new
//! key: the data would be unreadable forever, and silently starting from an
//! empty record would hide the loss.
//!
//! # Example
//!
//! ```rust
//! use catia_memory::cipher::CipherStore;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let store = CipherStore::open(dir.path().join("mem.enc"), dir.path().join("mem.key")).unwrap();
//!
//! assert!(store.load().unwrap().is_none());
//! store.save(b"{}").unwrap();
//! assert_eq!(store.load().unwrap().unwrap(), b"{}");
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use rand::rngs::OsRng;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::error::StorageError;

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

// ─────────────────────────────────────────────────────────────────────────────
// CipherStore
// ─────────────────────────────────────────────────────────────────────────────

/// Owns the key lifecycle and the encrypted memory file.
pub struct CipherStore {
    memory_path: PathBuf,
    key_path: PathBuf,
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for CipherStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherStore")
            .field("memory_path", &self.memory_path)
            .field("key_path", &self.key_path)
            .field("cipher", &"<redacted>")
            .finish()
    }
}

impl CipherStore {
    /// Open the store, loading the key from `key_path` or generating it when
    /// neither file exists yet.
    ///
    /// Returns [`StorageError::KeyMissing`] when `memory_path` exists without
    /// its key.
    pub fn open(
        memory_path: impl Into<PathBuf>,
        key_path: impl Into<PathBuf>,
    ) -> Result<Self, StorageError> {
        let memory_path = memory_path.into();
        let key_path = key_path.into();

        let key = if key_path.exists() {
            read_key(&key_path)?
        } else if memory_path.exists() {
            warn!(
                memory = %memory_path.display(),
                key = %key_path.display(),
                "Encrypted memory found without its key"
            );
            return Err(StorageError::KeyMissing {
                memory: memory_path,
                key: key_path,
            });
        } else {
            let key = generate_key();
            write_key(&key_path, &key)?;
            info!(key = %key_path.display(), "Generated new memory encryption key");
            key
        };

        let cipher =
            Aes256Gcm::new_from_slice(key.as_slice()).map_err(|e| StorageError::InvalidKey {
                path: key_path.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            memory_path,
            key_path,
            cipher,
        })
    }

    pub fn memory_path(&self) -> &Path {
        &self.memory_path
    }

    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    /// Decrypt the memory file.
    ///
    /// `Ok(None)` means the file does not exist yet.  A file that exists but
    /// fails authentication is [`StorageError::Corrupt`].
    pub fn load(&self) -> Result<Option<Vec<u8>>, StorageError> {
        let data = match fs::read(&self.memory_path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::io(&self.memory_path, e)),
        };
        let plaintext = self.decrypt(&data)?;
        debug!(path = %self.memory_path.display(), bytes = plaintext.len(), "Loaded encrypted memory");
        Ok(Some(plaintext))
    }

    /// Encrypt `plaintext` under a fresh nonce and atomically replace the
    /// memory file with it.
    pub fn save(&self, plaintext: &[u8]) -> Result<(), StorageError> {
        let sealed = self.encrypt(plaintext)?;
        write_atomic(&self.memory_path, &sealed)?;
        debug!(path = %self.memory_path.display(), bytes = sealed.len(), "Saved encrypted memory");
        Ok(())
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, StorageError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| StorageError::Encrypt(e.to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, StorageError> {
        if data.len() < NONCE_LEN {
            return Err(self.corrupt("file is too short to contain a nonce"));
        }
        let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| {
                warn!(path = %self.memory_path.display(), "Memory authentication failed");
                self.corrupt("authentication failed (wrong key or tampered data)")
            })
    }

    fn corrupt(&self, reason: &str) -> StorageError {
        StorageError::Corrupt {
            path: self.memory_path.clone(),
            reason: reason.to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Key material
// ─────────────────────────────────────────────────────────────────────────────

fn generate_key() -> Zeroizing<Vec<u8>> {
    let mut key = Zeroizing::new(vec![0u8; KEY_LEN]);
    OsRng.fill_bytes(key.as_mut_slice());
    key
}

fn read_key(path: &Path) -> Result<Zeroizing<Vec<u8>>, StorageError> {
    let encoded = Zeroizing::new(fs::read_to_string(path).map_err(|e| StorageError::io(path, e))?);
    let key = Zeroizing::new(STANDARD.decode(encoded.trim()).map_err(|e| {
        StorageError::InvalidKey {
            path: path.to_path_buf(),
            reason: format!("base64 decode error: {e}"),
        }
    })?);
    if key.len() != KEY_LEN {
        return Err(StorageError::InvalidKey {
            path: path.to_path_buf(),
            reason: format!("expected {KEY_LEN} bytes, got {}", key.len()),
        });
    }
    Ok(key)
}

fn write_key(path: &Path, key: &[u8]) -> Result<(), StorageError> {
    let encoded = Zeroizing::new(STANDARD.encode(key));
    write_atomic(path, encoded.as_bytes())
}

// ─────────────────────────────────────────────────────────────────────────────
// Atomic file replacement
// ─────────────────────────────────────────────────────────────────────────────

/// Per-process counter keeping concurrent temp files apart.
static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Write `payload` to a sibling temp file, flush it to disk and rename it over
/// `path`.  Files are created owner read/write only on Unix.
pub(crate) fn write_atomic(path: &Path, payload: &[u8]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
    }

    let mut temp_path = path.as_os_str().to_owned();
    let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
    temp_path.push(format!(".tmp.{}.{}", std::process::id(), seq));
    let temp_path = PathBuf::from(temp_path);

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(&temp_path)
        .map_err(|e| StorageError::io(&temp_path, e))?;
    file.write_all(payload)
        .and_then(|_| file.sync_all())
        .map_err(|e| StorageError::io(&temp_path, e))?;
    drop(file);

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        StorageError::io(path, e)
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
