//! Memory Store – the conversational memory engine.
//!
//! [`MemoryStore`] owns the decrypted [`MemoryRecord`] and every component
//! that reads or writes it.  Each mutating call follows the same transaction:
//!
//! 1. clone the cached record,
//! 2. apply the mutation to the clone,
//! 3. serialize, encrypt and atomically replace the memory file,
//! 4. only then swap the clone into the cache.
//!
//! A failed write therefore leaves both the file and the cache exactly as
//! they were.  Reads are served from the cache; call
//! [`reload`][MemoryStore::reload] if another process may have written the
//! file.
//!
//! # Example
//!
//! ```rust
//! use catia_memory::{MemoryConfig, MemoryStore, RememberOutcome};
//! use catia_types::Category;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let mut store = MemoryStore::open(&MemoryConfig::in_dir(dir.path())).unwrap();
//!
//! let outcome = store.remember("Hello", "Hey there!").unwrap();
//! assert_eq!(outcome, RememberOutcome::Learned { category: Category::Greetings });
//! assert_eq!(store.recall("hello"), Some("Hey there!"));
//! assert_eq!(store.fuzzy_recall("helo"), vec!["Hey there!"]);
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use catia_types::{Category, Correction, Exchange, Mood, RejectReason};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cipher::CipherStore;
use crate::classifier::Classifier;
use crate::config::MemoryConfig;
use crate::conversation_log::ConversationLog;
use crate::error::StorageError;
use crate::fuzzy::FuzzyMatcher;
use crate::record::{ConversationHistory, MemoryRecord, normalize};
use crate::validator::ResponseValidator;

// ─────────────────────────────────────────────────────────────────────────────
// Results
// ─────────────────────────────────────────────────────────────────────────────

/// What [`MemoryStore::remember`] did with a pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RememberOutcome {
    /// Stored; nothing similar was known before.
    Learned { category: Category },
    /// Stored; a similar input was already known.
    Updated { category: Category },
    /// The validator refused the response; nothing was written.
    Rejected(RejectReason),
}

impl RememberOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, RememberOutcome::Rejected(_))
    }
}

/// Snapshot of how much the store holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryStats {
    pub entries: BTreeMap<Category, usize>,
    pub total_entries: usize,
    pub corrections: usize,
    pub history_len: usize,
    pub mood: Mood,
    pub mood_trend: bool,
    pub last_topic: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// MemoryStore
// ─────────────────────────────────────────────────────────────────────────────

pub struct MemoryStore {
    cipher: CipherStore,
    classifier: Classifier,
    validator: ResponseValidator,
    matcher: FuzzyMatcher,
    log: Option<ConversationLog>,
    record: MemoryRecord,
}

impl MemoryStore {
    /// Open the store described by `config`.
    ///
    /// On first run the key is generated and an empty record is written.
    /// Fails if an existing memory file cannot be decrypted or parsed.
    pub fn open(config: &MemoryConfig) -> Result<Self, StorageError> {
        let cipher = CipherStore::open(&config.memory_path, &config.key_path)?;
        let mut store = Self {
            cipher,
            classifier: Classifier::new(config.category_keywords.clone()),
            validator: ResponseValidator::with_deny_list(config.deny_list.iter().cloned()),
            matcher: FuzzyMatcher::from(&config.fuzzy),
            log: config.conversation_log_path.as_ref().map(ConversationLog::new),
            record: MemoryRecord::empty(),
        };

        match store.read_record()? {
            Some(record) => {
                info!(
                    path = %config.memory_path.display(),
                    entries = record.entry_count(),
                    "Loaded memory"
                );
                store.record = record;
            }
            None => {
                store.cipher.save(&store.record.to_json()?)?;
                info!(path = %config.memory_path.display(), "Initialised empty memory");
            }
        }
        Ok(store)
    }

    /// Release the store.  Every mutation is already on disk.
    pub fn close(self) {
        debug!(path = %self.cipher.memory_path().display(), "Memory store closed");
    }

    /// Re-read the encrypted file, replacing the cached record.
    pub fn reload(&mut self) -> Result<(), StorageError> {
        self.record = self.read_record()?.unwrap_or_else(MemoryRecord::empty);
        debug!(entries = self.record.entry_count(), "Memory reloaded");
        Ok(())
    }

    fn read_record(&self) -> Result<Option<MemoryRecord>, StorageError> {
        let record = self
            .cipher
            .load()?
            .map(|bytes| MemoryRecord::from_json(&bytes))
            .transpose()?;
        Ok(record)
    }

    /// Apply `mutate` to a copy of the record, persist it, then commit it to
    /// the cache.
    fn commit<T>(&mut self, mutate: impl FnOnce(&mut MemoryRecord) -> T) -> Result<T, StorageError> {
        let mut next = self.record.clone();
        let out = mutate(&mut next);
        self.cipher.save(&next.to_json()?)?;
        self.record = next;
        Ok(out)
    }

    // ── Learned responses ────────────────────────────────────────────────────

    /// Validate, classify and store `input → response`.
    pub fn remember(&mut self, input: &str, response: &str) -> Result<RememberOutcome, StorageError> {
        if let Err(reason) = self.validator.validate(response) {
            warn!(input, %reason, "Skipping memory save: invalid response");
            return Ok(RememberOutcome::Rejected(reason));
        }

        let key = normalize(input);
        let category = self.classifier.classify(&key);
        let similar_known = !self
            .matcher
            .find_similar(&key, self.record.keys())
            .is_empty();

        self.commit(|record| record.insert(category, key.clone(), response.to_string()))?;

        if similar_known {
            info!(%category, input = %key, "Updating memory for similar input");
            Ok(RememberOutcome::Updated { category })
        } else {
            info!(%category, input = %key, "Learning new response");
            Ok(RememberOutcome::Learned { category })
        }
    }

    /// Exact lookup of the normalized `input`, first hit in category priority
    /// order.
    pub fn recall(&self, input: &str) -> Option<&str> {
        self.record.find(&normalize(input)).map(|(_, response)| response)
    }

    /// Responses whose stored inputs resemble `input`, best match first.
    pub fn fuzzy_recall(&self, input: &str) -> Vec<&str> {
        let query = normalize(input);
        self.matcher
            .find_similar(&query, self.record.keys())
            .into_iter()
            .filter_map(|hit| self.record.find(hit.candidate).map(|(_, response)| response))
            .collect()
    }

    /// Every learned pair as `(category, input, response)`, in category
    /// priority order then insertion order.
    pub fn memories(&self) -> impl Iterator<Item = (Category, &str, &str)> {
        self.record.entries()
    }

    /// Category currently holding `input`, if any.
    pub fn category_of(&self, input: &str) -> Option<Category> {
        self.record.find(&normalize(input)).map(|(category, _)| category)
    }

    /// Remove `input` from whichever category holds it.  Returns `false`
    /// without writing when it was not stored.
    pub fn forget(&mut self, input: &str) -> Result<bool, StorageError> {
        let key = normalize(input);
        if self.record.find(&key).is_none() {
            return Ok(false);
        }
        if let Some((category, _)) = self.commit(|record| record.remove(&key))? {
            info!(%category, input = %key, "Forgot memory");
        }
        Ok(true)
    }

    /// Reset to the empty seeded record.
    pub fn clear_all(&mut self) -> Result<(), StorageError> {
        self.commit(|record| *record = MemoryRecord::empty())?;
        info!("Memory cleared");
        Ok(())
    }

    // ── Corrections ──────────────────────────────────────────────────────────

    /// Track a correction for `input`.  Returns how many times it has now
    /// been corrected.  The first correction is kept; later ones only bump
    /// the count.
    pub fn record_feedback(&mut self, input: &str, corrected: &str) -> Result<u32, StorageError> {
        let key = normalize(input);
        let count = self.commit(|record| {
            let correction = record
                .incorrect_responses
                .entry(key.clone())
                .and_modify(|c| c.count = c.count.saturating_add(1))
                .or_insert_with(|| Correction {
                    response: corrected.to_string(),
                    count: 1,
                });
            correction.count
        })?;
        info!(input = %key, count, "Recorded correction");
        Ok(count)
    }

    /// The correction for `input`, applied from the first recorded mistake.
    pub fn get_feedback(&self, input: &str) -> Option<&str> {
        self.record
            .incorrect_responses
            .get(&normalize(input))
            .map(|c| c.response.as_str())
    }

    // ── Conversation ─────────────────────────────────────────────────────────

    pub fn append_conversation(&mut self, input: &str, response: &str) -> Result<(), StorageError> {
        self.commit(|record| record.conversation_history.push(Exchange::new(input, response)))
    }

    pub fn set_last_topic(&mut self, topic: &str) -> Result<(), StorageError> {
        self.commit(|record| record.last_topic = Some(topic.to_string()))
    }

    pub fn last_topic(&self) -> Option<&str> {
        self.record.last_topic.as_deref()
    }

    /// Append to the history and move the topic pointer in one encrypted
    /// write, then mirror the exchange into the plaintext log if enabled.
    ///
    /// Only the encrypted write can fail the call.  The plaintext log is a
    /// best-effort mirror: a failure there is logged and the call succeeds.
    pub fn record_exchange(&mut self, input: &str, response: &str) -> Result<(), StorageError> {
        self.commit(|record| {
            record.conversation_history.push(Exchange::new(input, response));
            record.last_topic = Some(input.to_string());
        })?;
        if let Some(log) = &self.log
            && let Err(e) = log.append(input, response)
        {
            warn!(path = %log.path().display(), error = %e, "Conversation log not updated");
        }
        Ok(())
    }

    pub fn conversation_history(&self) -> &ConversationHistory {
        &self.record.conversation_history
    }

    pub fn conversation_log(&self) -> Option<&ConversationLog> {
        self.log.as_ref()
    }

    // ── Mood ─────────────────────────────────────────────────────────────────

    pub fn push_mood(&mut self, mood: Mood) -> Result<(), StorageError> {
        self.commit(|record| record.past_emotions.push(mood))
    }

    /// Run the sticky transition from the current mood with the caller's
    /// `detected` signal and record the result.
    pub fn observe_mood(&mut self, detected: Option<Mood>) -> Result<Mood, StorageError> {
        let before = self.current_mood();
        let after = self.commit(|record| record.past_emotions.observe(detected))?;
        if before != after {
            info!(from = %before, to = %after, "Mood changed");
        }
        Ok(after)
    }

    pub fn reset_mood(&mut self) -> Result<(), StorageError> {
        self.commit(|record| record.past_emotions.reset_to_neutral())?;
        info!("Mood reset to neutral");
        Ok(())
    }

    pub fn current_mood(&self) -> Mood {
        self.record.past_emotions.current()
    }

    pub fn mood_trend(&self) -> bool {
        self.record.past_emotions.trend()
    }

    // ── Inspection ───────────────────────────────────────────────────────────

    pub fn record(&self) -> &MemoryRecord {
        &self.record
    }

    pub fn stats(&self) -> MemoryStats {
        let entries: BTreeMap<Category, usize> = self
            .record
            .categories
            .iter()
            .map(|(&category, bucket)| (category, bucket.len()))
            .collect();
        MemoryStats {
            total_entries: entries.values().sum(),
            entries,
            corrections: self.record.incorrect_responses.len(),
            history_len: self.record.conversation_history.len(),
            mood: self.current_mood(),
            mood_trend: self.mood_trend(),
            last_topic: self.record.last_topic.clone(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SharedMemoryStore
// ─────────────────────────────────────────────────────────────────────────────

/// A [`MemoryStore`] behind a single mutex.
///
/// Persistence rewrites the whole record, so two unsynchronized writers would
/// silently drop each other's changes.  Every thread that touches the store
/// goes through [`with`][SharedMemoryStore::with].
#[derive(Clone)]
pub struct SharedMemoryStore {
    inner: Arc<Mutex<MemoryStore>>,
}

impl SharedMemoryStore {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Run `f` with exclusive access to the store.
    pub fn with<T>(
        &self,
        f: impl FnOnce(&mut MemoryStore) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut guard = self.inner.lock().map_err(|_| StorageError::Poisoned)?;
        f(&mut guard)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn open_in(dir: &tempfile::TempDir) -> MemoryStore {
        MemoryStore::open(&MemoryConfig::in_dir(dir.path())).unwrap()
    }

    // ── remember / recall ────────────────────────────────────────────────────

    #[test]
    fn remember_then_recall_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(&dir);
        store.remember("hello", "Hey there!").unwrap();
        assert_eq!(store.recall("hello"), Some("Hey there!"));
    }

    #[test]
    fn recall_normalizes_input() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(&dir);
        store.remember("  Tell me   a JOKE ", "Knock knock.").unwrap();
        assert_eq!(store.recall("tell me a joke"), Some("Knock knock."));
        assert_eq!(store.category_of("TELL ME A JOKE"), Some(Category::Jokes));
    }

    #[test]
    fn rejected_response_is_not_stored() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(&dir);
        let outcome = store.remember("test", "").unwrap();
        assert_eq!(outcome, RememberOutcome::Rejected(RejectReason::Blank));
        assert!(outcome.is_rejected());
        assert_eq!(store.recall("test"), None);

        let outcome = store.remember("test", "No relevant results found.").unwrap();
        assert!(matches!(outcome, RememberOutcome::Rejected(RejectReason::DenyListed(_))));
        assert_eq!(store.record().entry_count(), 0);
    }

    #[test]
    fn similar_input_reports_update() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(&dir);
        assert_eq!(
            store.remember("hello there", "Hi!").unwrap(),
            RememberOutcome::Learned { category: Category::Greetings }
        );
        assert_eq!(
            store.remember("hello there!", "Hi again!").unwrap(),
            RememberOutcome::Updated { category: Category::Greetings }
        );
        // Near-duplicates never block the write.
        assert_eq!(store.recall("hello there"), Some("Hi!"));
        assert_eq!(store.recall("hello there!"), Some("Hi again!"));
    }

    #[test]
    fn overwriting_keeps_one_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(&dir);
        store.remember("yes", "Great.").unwrap();
        store.remember("yes", "Perfect.").unwrap();
        assert_eq!(store.recall("yes"), Some("Perfect."));
        assert_eq!(store.record().entry_count(), 1);
    }

    #[test]
    fn fuzzy_recall_returns_responses_for_typos() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(&dir);
        store.remember("hello there", "General Kenobi.").unwrap();
        assert_eq!(store.fuzzy_recall("helo there"), vec!["General Kenobi."]);
        assert!(store.fuzzy_recall("completely unrelated text").is_empty());
    }

    #[test]
    fn fuzzy_recall_is_capped_at_max_results() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(&dir);
        for (i, input) in ["good night", "good nite", "good knight", "goood night"]
            .into_iter()
            .enumerate()
        {
            store.remember(input, &format!("r{i}")).unwrap();
        }
        let hits = store.fuzzy_recall("good night");
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0], "r0");
    }

    #[test]
    fn memories_lists_every_pair_in_priority_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(&dir);
        assert_eq!(store.memories().count(), 0);

        store.remember("hello", "Hey").unwrap();
        store.remember("tell me a joke", "No.").unwrap();
        store.remember("hey you", "Yo").unwrap();

        let listed: Vec<_> = store.memories().collect();
        assert_eq!(
            listed,
            vec![
                (Category::Jokes, "tell me a joke", "No."),
                (Category::Greetings, "hello", "Hey"),
                (Category::Greetings, "hey you", "Yo"),
            ]
        );

        // Every listed input is a valid `forget` target.
        let inputs: Vec<String> = store.memories().map(|(_, i, _)| i.to_string()).collect();
        for input in inputs {
            assert!(store.forget(&input).unwrap());
        }
        assert_eq!(store.memories().count(), 0);
    }

    // ── forget / clear ───────────────────────────────────────────────────────

    #[test]
    fn forget_removes_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(&dir);
        store.remember("bye", "See ya.").unwrap();
        assert!(store.forget("BYE").unwrap());
        assert_eq!(store.recall("bye"), None);

        let reopened = open_in(&dir);
        assert_eq!(reopened.recall("bye"), None);
    }

    #[test]
    fn forget_absent_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(&dir);
        let before = fs::read(dir.path().join("catia_memory.enc")).unwrap();
        assert!(!store.forget("never stored").unwrap());
        let after = fs::read(dir.path().join("catia_memory.enc")).unwrap();
        assert_eq!(before, after, "no write should happen");
    }

    #[test]
    fn clear_all_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(&dir);
        store.remember("hello", "Hey").unwrap();
        store.record_feedback("x", "Y").unwrap();
        store.record_exchange("hello", "Hey").unwrap();
        store.push_mood(Mood::Sad).unwrap();

        store.clear_all().unwrap();
        let once = store.record().clone();
        store.clear_all().unwrap();
        assert_eq!(store.record(), &once);
        assert_eq!(once, MemoryRecord::empty());
    }

    // ── corrections ──────────────────────────────────────────────────────────

    #[test]
    fn feedback_applies_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(&dir);
        assert_eq!(store.get_feedback("x"), None);
        assert_eq!(store.record_feedback("x", "Y").unwrap(), 1);
        assert_eq!(store.get_feedback("x"), Some("Y"));
    }

    #[test]
    fn repeated_feedback_increments_count() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(&dir);
        store.record_feedback("what is 2+2", "4").unwrap();
        assert_eq!(store.record_feedback("What is 2+2", "Four").unwrap(), 2);
        assert_eq!(store.get_feedback("what is 2+2"), Some("4"));
        assert_eq!(store.record().incorrect_responses["what is 2+2"].count, 2);
    }

    #[test]
    fn first_correction_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(&dir);
        store.record_feedback("x", "A").unwrap();
        store.record_feedback("x", "B").unwrap();
        assert_eq!(store.get_feedback("x"), Some("A"));
        store.close();

        let reopened = open_in(&dir);
        assert_eq!(reopened.get_feedback("x"), Some("A"));
        assert_eq!(reopened.record().incorrect_responses["x"].count, 2);
    }

    // ── conversation ─────────────────────────────────────────────────────────

    #[test]
    fn history_keeps_last_twenty() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(&dir);
        for i in 0..25 {
            store.append_conversation(&format!("q{i}"), &format!("a{i}")).unwrap();
        }
        let inputs: Vec<&str> = store
            .conversation_history()
            .iter()
            .map(|e| e.input.as_str())
            .collect();
        let expected: Vec<String> = (5..25).map(|i| format!("q{i}")).collect();
        assert_eq!(inputs, expected);
    }

    #[test]
    fn record_exchange_moves_topic_and_logs() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(&dir);
        store.record_exchange("tell me about mars", "It's red.").unwrap();
        store.record_exchange("and venus?", "It's hot.").unwrap();

        assert_eq!(store.last_topic(), Some("and venus?"));
        assert_eq!(store.conversation_history().len(), 2);
        let logged = store.conversation_log().unwrap().load().unwrap();
        assert_eq!(logged.len(), 2);
        assert_eq!(logged[1].catia, "It's hot.");
    }

    #[test]
    fn broken_conversation_log_does_not_fail_the_exchange() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(&dir);
        let log_path = dir.path().join("conversation_log.json");
        fs::write(&log_path, "not json").unwrap();

        store.record_exchange("hi", "hey").unwrap();
        assert_eq!(store.conversation_history().len(), 1);
        assert_eq!(store.last_topic(), Some("hi"));
        assert_eq!(fs::read_to_string(&log_path).unwrap(), "not json");

        // One call, one exchange: nothing for a caller to retry.
        let reopened = open_in(&dir);
        assert_eq!(reopened.conversation_history().len(), 1);
    }

    #[test]
    fn last_topic_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(&dir);
        assert_eq!(store.last_topic(), None);
        store.set_last_topic("rust").unwrap();
        store.set_last_topic("python").unwrap();
        assert_eq!(store.last_topic(), Some("python"));
    }

    #[test]
    fn disabled_conversation_log_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = MemoryConfig::in_dir(dir.path());
        cfg.conversation_log_path = None;
        let mut store = MemoryStore::open(&cfg).unwrap();
        store.record_exchange("hi", "hey").unwrap();
        assert!(store.conversation_log().is_none());
        assert!(!dir.path().join("conversation_log.json").exists());
    }

    // ── mood ─────────────────────────────────────────────────────────────────

    #[test]
    fn mood_trend_through_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(&dir);
        assert_eq!(store.current_mood(), Mood::Neutral);
        for _ in 0..3 {
            store.push_mood(Mood::Happy).unwrap();
        }
        assert!(store.mood_trend());

        store.clear_all().unwrap();
        for m in [Mood::Happy, Mood::Sad, Mood::Happy] {
            store.push_mood(m).unwrap();
        }
        assert!(!store.mood_trend());
    }

    #[test]
    fn observed_mood_is_sticky_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(&dir);
        assert_eq!(store.observe_mood(Some(Mood::Angry)).unwrap(), Mood::Angry);
        assert_eq!(store.observe_mood(Some(Mood::Happy)).unwrap(), Mood::Angry);
        drop(store);

        let mut reopened = open_in(&dir);
        assert_eq!(reopened.current_mood(), Mood::Angry);
        reopened.reset_mood().unwrap();
        assert_eq!(reopened.observe_mood(Some(Mood::Happy)).unwrap(), Mood::Happy);
        assert!(reopened.record().past_emotions.len() <= crate::mood::MOOD_HISTORY_LIMIT);
    }

    // ── persistence ──────────────────────────────────────────────────────────

    #[test]
    fn first_open_writes_empty_encrypted_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_in(&dir);
        assert!(dir.path().join("catia_memory.enc").exists());
        assert!(dir.path().join("memory_key.key").exists());
        assert_eq!(store.record(), &MemoryRecord::empty());
        store.close();
    }

    #[test]
    fn reopen_reproduces_identical_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(&dir);
        store.remember("you are cute", "Stop it~").unwrap();
        store.remember("why is the sky blue", "Rayleigh scattering.").unwrap();
        store.record_feedback("x", "Y").unwrap();
        store.record_exchange("hi", "hey").unwrap();
        store.push_mood(Mood::Happy).unwrap();
        let written = store.record().clone();
        store.close();

        let reopened = open_in(&dir);
        assert_eq!(reopened.record(), &written);
    }

    #[test]
    fn deleted_key_fails_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(&dir);
        store.remember("hello", "Hey").unwrap();
        store.close();
        fs::remove_file(dir.path().join("memory_key.key")).unwrap();

        let err = MemoryStore::open(&MemoryConfig::in_dir(dir.path())).err().unwrap();
        assert!(matches!(err, StorageError::KeyMissing { .. }));
    }

    #[test]
    fn corrupted_memory_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        open_in(&dir).close();
        fs::write(dir.path().join("catia_memory.enc"), b"garbage bytes here").unwrap();

        let err = MemoryStore::open(&MemoryConfig::in_dir(dir.path())).err().unwrap();
        assert!(matches!(err, StorageError::Corrupt { .. }));
    }

    #[test]
    fn failed_write_leaves_cache_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = MemoryConfig::in_dir(dir.path());
        cfg.memory_path = dir.path().join("sub").join("catia_memory.enc");
        let mut store = MemoryStore::open(&cfg).unwrap();

        // Replace the memory directory with a plain file so the write fails.
        fs::remove_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub"), b"blocker").unwrap();

        assert!(store.remember("hello", "Hey").is_err());
        assert_eq!(store.recall("hello"), None);
        assert_eq!(store.record(), &MemoryRecord::empty());
    }

    #[test]
    fn reload_sees_writes_from_another_handle() {
        let dir = tempfile::tempdir().unwrap();
        let mut reader = open_in(&dir);
        let mut writer = open_in(&dir);
        writer.remember("sup", "Not much.").unwrap();

        assert_eq!(reader.recall("sup"), None);
        reader.reload().unwrap();
        assert_eq!(reader.recall("sup"), Some("Not much."));
    }

    #[test]
    fn stats_count_everything() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(&dir);
        store.remember("hello", "Hey").unwrap();
        store.remember("hey you", "Yo").unwrap();
        store.remember("tell me a joke", "No.").unwrap();
        store.record_feedback("x", "Y").unwrap();
        store.record_exchange("hello", "Hey").unwrap();

        let stats = store.stats();
        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.entries[&Category::Greetings], 2);
        assert_eq!(stats.entries[&Category::Jokes], 1);
        assert_eq!(stats.corrections, 1);
        assert_eq!(stats.history_len, 1);
        assert_eq!(stats.mood, Mood::Neutral);
        assert_eq!(stats.last_topic.as_deref(), Some("hello"));
    }

    // ── SharedMemoryStore ────────────────────────────────────────────────────

    #[test]
    fn shared_store_serializes_writers() {
        let dir = tempfile::tempdir().unwrap();
        let shared = SharedMemoryStore::new(open_in(&dir));

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    for i in 0..5 {
                        shared
                            .with(|s| s.remember(&format!("thread {t} item {i}"), "ok"))
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let total = shared.with(|s| Ok(s.record().entry_count())).unwrap();
        assert_eq!(total, 20);

        let reopened = open_in(&dir);
        assert_eq!(reopened.record().entry_count(), 20);
    }
}
