//! The persisted aggregate.
//!
//! A [`MemoryRecord`] is the single unit of persistence: it is serialized to
//! JSON as a whole, encrypted and written in one go.  Its shape:
//!
//! ```text
//! {
//!   "categories": { "flirtation": { "<input>": "<response>", … }, … },
//!   "incorrect_responses": { "<input>": { "response": "…", "count": 2 } },
//!   "conversation_history": [ { "user": "…", "catia": "…" }, … ],
//!   "past_emotions": [ "neutral", "happy", … ],
//!   "last_topic": "…" | null
//! }
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use catia_types::{Category, Correction, Exchange};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::mood::MoodTracker;

/// Number of exchanges retained in [`MemoryRecord::conversation_history`].
pub const HISTORY_LIMIT: usize = 20;

/// Canonical form of an input key: trimmed, lower-cased, inner whitespace
/// collapsed to single spaces.
pub fn normalize(input: &str) -> String {
    input
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

// ─────────────────────────────────────────────────────────────────────────────
// Bucket
// ─────────────────────────────────────────────────────────────────────────────

/// Input → response pairs of one category, in insertion order.
///
/// Serializes as a JSON object whose key order is the insertion order.
/// Overwriting an existing key keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bucket {
    entries: Vec<(String, String)>,
}

impl Bucket {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Insert or overwrite.  Returns the previous response, if any.
    pub fn insert(&mut self, key: String, value: String) -> Option<String> {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => Some(std::mem::replace(v, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Bucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de> Deserialize<'de> for Bucket {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BucketVisitor;

        impl<'de> Visitor<'de> for BucketVisitor {
            type Value = Bucket;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of input to response")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Bucket, A::Error> {
                let mut bucket = Bucket::default();
                while let Some((key, value)) = map.next_entry::<String, String>()? {
                    bucket.insert(key, value);
                }
                Ok(bucket)
            }
        }

        deserializer.deserialize_map(BucketVisitor)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ConversationHistory
// ─────────────────────────────────────────────────────────────────────────────

/// Ring buffer of the most recent [`HISTORY_LIMIT`] exchanges, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationHistory {
    exchanges: VecDeque<Exchange>,
}

impl ConversationHistory {
    pub fn push(&mut self, exchange: Exchange) {
        self.exchanges.push_back(exchange);
        self.enforce_limit();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Exchange> {
        self.exchanges.iter()
    }

    pub fn last(&self) -> Option<&Exchange> {
        self.exchanges.back()
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    pub(crate) fn enforce_limit(&mut self) {
        while self.exchanges.len() > HISTORY_LIMIT {
            self.exchanges.pop_front();
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MemoryRecord
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Learned input → response pairs.  Always holds every [`Category`].
    #[serde(default)]
    pub categories: BTreeMap<Category, Bucket>,
    /// User corrections, keyed by normalized input.
    #[serde(default)]
    pub incorrect_responses: BTreeMap<String, Correction>,
    #[serde(default)]
    pub conversation_history: ConversationHistory,
    #[serde(default)]
    pub past_emotions: MoodTracker,
    #[serde(default)]
    pub last_topic: Option<String>,
}

impl Default for MemoryRecord {
    fn default() -> Self {
        Self::empty()
    }
}

impl MemoryRecord {
    /// The empty record with every category pre-seeded.
    pub fn empty() -> Self {
        let mut record = Self {
            categories: BTreeMap::new(),
            incorrect_responses: BTreeMap::new(),
            conversation_history: ConversationHistory::default(),
            past_emotions: MoodTracker::default(),
            last_topic: None,
        };
        record.seed();
        record
    }

    /// Parse a record from its canonical JSON, restoring the invariants a
    /// hand-edited or older file may have lost.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let mut record: MemoryRecord = serde_json::from_slice(bytes)?;
        record.seed();
        record.conversation_history.enforce_limit();
        record.past_emotions.enforce_limit();
        Ok(record)
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    fn seed(&mut self) {
        for category in Category::ALL {
            self.categories.entry(category).or_default();
        }
    }

    /// First category, in priority order, holding `key`.
    pub fn find(&self, key: &str) -> Option<(Category, &str)> {
        self.categories
            .iter()
            .find_map(|(&category, bucket)| bucket.get(key).map(|v| (category, v)))
    }

    /// File `key` under `category`, removing it from every other category.
    pub fn insert(&mut self, category: Category, key: String, value: String) -> Option<String> {
        let mut previous = None;
        for (&other, bucket) in self.categories.iter_mut() {
            if other != category
                && let Some(old) = bucket.remove(&key)
            {
                previous = Some(old);
            }
        }
        let replaced = self.categories.entry(category).or_default().insert(key, value);
        replaced.or(previous)
    }

    /// Remove `key` from whichever category holds it.
    pub fn remove(&mut self, key: &str) -> Option<(Category, String)> {
        self.categories
            .iter_mut()
            .find_map(|(&category, bucket)| bucket.remove(key).map(|v| (category, v)))
    }

    /// Every stored key, in category priority order then insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.categories.values().flat_map(Bucket::keys)
    }

    /// Every `(category, key, value)` triple, in category priority order then
    /// insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (Category, &str, &str)> {
        self.categories
            .iter()
            .flat_map(|(&category, bucket)| bucket.iter().map(move |(k, v)| (category, k, v)))
    }

    pub fn entry_count(&self) -> usize {
        self.categories.values().map(Bucket::len).sum()
    }
}
