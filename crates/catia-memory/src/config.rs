//! Engine configuration injected into [`MemoryStore::open`].
//!
//! Everything here is loaded once and never mutated while a store is open.
//! All fields carry serde defaults so a partial `[memory]` table in the
//! binary's TOML file fills in the rest.
//!
//! [`MemoryStore::open`]: crate::store::MemoryStore::open

use std::path::PathBuf;

use catia_types::{Category, Mood};
use serde::{Deserialize, Serialize};

/// Boilerplate answers that must never be learned.
pub const DEFAULT_DENY_LIST: [&str; 6] = [
    "Oh? You’ve been thinking about me? How scandalous!",
    "Wow, I'm blushing! If I had a face, that is.",
    "Flattery detected. Should I act impressed?",
    "No relevant results found.",
    "None",
    "DictionaryDefinitions from Oxford Languages",
];

fn strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// MemoryConfig
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Encrypted memory record.
    #[serde(default = "default_memory_path")]
    pub memory_path: PathBuf,

    /// Base64-encoded AES-256 key.  Created on first open.
    #[serde(default = "default_key_path")]
    pub key_path: PathBuf,

    /// Plaintext, human-readable log of every recorded exchange.  `None`
    /// disables it.
    #[serde(default = "default_conversation_log_path")]
    pub conversation_log_path: Option<PathBuf>,

    /// Responses refused by the validator (compared after trimming).
    #[serde(default = "default_deny_list")]
    pub deny_list: Vec<String>,

    #[serde(default)]
    pub category_keywords: CategoryKeywords,

    #[serde(default)]
    pub mood_keywords: MoodKeywords,

    #[serde(default)]
    pub fuzzy: FuzzyConfig,
}

fn default_memory_path() -> PathBuf {
    PathBuf::from("memory").join("catia_memory.enc")
}
fn default_key_path() -> PathBuf {
    PathBuf::from("memory").join("memory_key.key")
}
fn default_conversation_log_path() -> Option<PathBuf> {
    Some(PathBuf::from("memory").join("conversation_log.json"))
}
fn default_deny_list() -> Vec<String> {
    strings(&DEFAULT_DENY_LIST)
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            memory_path: default_memory_path(),
            key_path: default_key_path(),
            conversation_log_path: default_conversation_log_path(),
            deny_list: default_deny_list(),
            category_keywords: CategoryKeywords::default(),
            mood_keywords: MoodKeywords::default(),
            fuzzy: FuzzyConfig::default(),
        }
    }
}

impl MemoryConfig {
    /// Default configuration with every file placed under `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            memory_path: dir.join("catia_memory.enc"),
            key_path: dir.join("memory_key.key"),
            conversation_log_path: Some(dir.join("conversation_log.json")),
            ..Self::default()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Keyword tables
// ─────────────────────────────────────────────────────────────────────────────

/// Keyword list per [`Category`].  [`Category::Casual`] has none; it is the
/// fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryKeywords {
    pub flirtation: Vec<String>,
    pub jokes: Vec<String>,
    pub facts: Vec<String>,
    pub questions: Vec<String>,
    pub greetings: Vec<String>,
    pub goodbyes: Vec<String>,
    pub affirmations: Vec<String>,
    pub negations: Vec<String>,
}

impl Default for CategoryKeywords {
    fn default() -> Self {
        Self {
            flirtation: strings(&[
                "beautiful", "hot", "gorgeous", "sexy", "cute", "stunning", "ravishing", "luscious",
            ]),
            jokes: strings(&["joke", "funny", "laugh"]),
            facts: strings(&["what is", "who is", "tell me about", "explain", "define"]),
            questions: strings(&[
                "how", "why", "when", "where", "does", "can", "is", "should", "will",
            ]),
            greetings: strings(&[
                "hello",
                "hi",
                "hey",
                "good morning",
                "good afternoon",
                "good evening",
                "yo",
                "sup",
            ]),
            goodbyes: strings(&["bye", "goodbye", "see you", "later", "farewell", "take care"]),
            affirmations: strings(&["yes", "yeah", "yep", "sure", "absolutely", "of course"]),
            negations: strings(&["no", "nah", "nope", "never", "not really"]),
        }
    }
}

impl CategoryKeywords {
    pub fn for_category(&self, category: Category) -> &[String] {
        match category {
            Category::Flirtation => &self.flirtation,
            Category::Jokes => &self.jokes,
            Category::Facts => &self.facts,
            Category::Questions => &self.questions,
            Category::Greetings => &self.greetings,
            Category::Goodbyes => &self.goodbyes,
            Category::Affirmations => &self.affirmations,
            Category::Negations => &self.negations,
            Category::Casual => &[],
        }
    }
}

/// Keyword list per non-neutral [`Mood`], used by the caller-side detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoodKeywords {
    pub angry: Vec<String>,
    pub sad: Vec<String>,
    pub horny: Vec<String>,
    pub happy: Vec<String>,
}

impl Default for MoodKeywords {
    fn default() -> Self {
        Self {
            angry: strings(&["mad", "pissed", "furious", "annoyed", "irritated"]),
            sad: strings(&["depressed", "unhappy", "miserable", "lonely", "cry"]),
            horny: strings(&["hot", "turned on", "needy", "moan", "naughty"]),
            happy: strings(&["excited", "great", "amazing", "love", "happy", "awesome"]),
        }
    }
}

impl MoodKeywords {
    pub fn for_mood(&self, mood: Mood) -> &[String] {
        match mood {
            Mood::Angry => &self.angry,
            Mood::Sad => &self.sad,
            Mood::Horny => &self.horny,
            Mood::Happy => &self.happy,
            Mood::Neutral => &[],
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FuzzyConfig
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzyConfig {
    /// Upper bound on matches returned by fuzzy recall.
    pub max_results: usize,
    /// Minimum similarity ratio in `[0, 1]` a stored key must reach.
    pub min_similarity: f64,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        Self {
            max_results: 3,
            min_similarity: 0.7,
        }
    }
}
