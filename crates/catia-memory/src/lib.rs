//! `catia-memory` – Catia's long-term memory.
//!
//! Persists learned input → response pairs, user corrections, recent
//! conversation and mood history to a single AES-256-GCM encrypted file.
//!
//! # Modules
//!
//! - [`store`] – [`MemoryStore`][store::MemoryStore]: the public engine.
//!   Every mutation is encrypted and atomically written before it becomes
//!   visible.  [`SharedMemoryStore`][store::SharedMemoryStore] wraps it for
//!   use from several threads.
//! - [`cipher`] – [`CipherStore`][cipher::CipherStore]: key management and
//!   sealed-file I/O.
//! - [`record`] – [`MemoryRecord`][record::MemoryRecord]: the plaintext
//!   document and input normalization.
//! - [`classifier`] – keyword category classification.
//! - [`fuzzy`] – similarity ranking for near-miss recall.
//! - [`mood`] – sticky mood state machine and keyword mood detection.
//! - [`validator`] – rule engine gating which responses may be learned.
//! - [`conversation_log`] – optional plaintext transcript.
//! - [`config`] – [`MemoryConfig`][config::MemoryConfig] and its defaults.

pub mod cipher;
pub mod classifier;
pub mod config;
pub mod conversation_log;
pub mod error;
pub mod fuzzy;
pub mod mood;
pub mod record;
pub mod store;
pub mod validator;

pub use config::MemoryConfig;
pub use error::StorageError;
pub use mood::MoodDetector;
pub use store::{MemoryStats, MemoryStore, RememberOutcome, SharedMemoryStore};
