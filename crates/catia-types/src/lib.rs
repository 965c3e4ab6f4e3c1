use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Semantic bucket a remembered input is filed under.
///
/// Declaration order is the classification priority: when an input matches
/// keywords from several categories, the earliest variant wins.  [`Casual`]
/// is the fallback and always sorts last.
///
/// [`Casual`]: Category::Casual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Flirtation,
    Jokes,
    Facts,
    Questions,
    Greetings,
    Goodbyes,
    Affirmations,
    Negations,
    Casual,
}

impl Category {
    /// Every category, in classification priority order.
    pub const ALL: [Category; 9] = [
        Category::Flirtation,
        Category::Jokes,
        Category::Facts,
        Category::Questions,
        Category::Greetings,
        Category::Goodbyes,
        Category::Affirmations,
        Category::Negations,
        Category::Casual,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Flirtation => "flirtation",
            Category::Jokes => "jokes",
            Category::Facts => "facts",
            Category::Questions => "questions",
            Category::Greetings => "greetings",
            Category::Goodbyes => "goodbyes",
            Category::Affirmations => "affirmations",
            Category::Negations => "negations",
            Category::Casual => "casual",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| ParseLabelError {
                kind: "category",
                value: s.to_string(),
            })
    }
}

/// Sticky emotional-state label attached to the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    #[default]
    Neutral,
    Angry,
    Sad,
    Horny,
    Happy,
}

impl Mood {
    pub const ALL: [Mood; 5] = [Mood::Neutral, Mood::Angry, Mood::Sad, Mood::Horny, Mood::Happy];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Neutral => "neutral",
            Mood::Angry => "angry",
            Mood::Sad => "sad",
            Mood::Horny => "horny",
            Mood::Happy => "happy",
        }
    }

    pub fn is_neutral(&self) -> bool {
        *self == Mood::Neutral
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Mood::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| ParseLabelError {
                kind: "mood",
                value: s.to_string(),
            })
    }
}

/// One user ↔ agent turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    /// What the user said.
    #[serde(rename = "user")]
    pub input: String,
    /// What the agent answered.
    #[serde(rename = "catia")]
    pub response: String,
}

impl Exchange {
    pub fn new(input: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            response: response.into(),
        }
    }
}

/// A user-supplied override for a specific input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    /// The response to give instead of whatever was learned.
    pub response: String,
    /// How many times the user has had to correct this input.
    pub count: u32,
}

/// Why the response validator refused a write.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    #[error("response is empty or whitespace-only")]
    Blank,
    #[error("response is deny-listed boilerplate: {0:?}")]
    DenyListed(String),
}

/// Returned when a string does not name a known [`Category`] or [`Mood`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} label: {value:?}")]
pub struct ParseLabelError {
    pub kind: &'static str,
    pub value: String,
}
