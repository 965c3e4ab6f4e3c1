//! Mood Tracker – sticky mood state machine with a bounded history.
//!
//! ## Transitions
//!
//! The conversation is always in exactly one [`Mood`].  The caller detects a
//! signal from each input (see [`MoodDetector`]) and feeds it to
//! [`transition`]:
//!
//! | current state | detected signal | next state      |
//! |---------------|-----------------|-----------------|
//! | neutral       | none            | neutral         |
//! | neutral       | `m`             | `m`             |
//! | non-neutral   | anything        | current (stays) |
//!
//! The only way out of a non-neutral mood is the explicit
//! [`MoodTracker::reset_to_neutral`] transition; nothing decays with time.
//!
//! ## History
//!
//! [`MoodTracker`] keeps the last [`MOOD_HISTORY_LIMIT`] states.  The newest
//! entry is the current state, and three identical trailing entries count as a
//! strong trend.
//!
//! ```rust
//! use catia_memory::mood::MoodTracker;
//! use catia_types::Mood;
//!
//! let mut tracker = MoodTracker::default();
//! assert_eq!(tracker.current(), Mood::Neutral);
//!
//! tracker.observe(Some(Mood::Angry));
//! tracker.observe(Some(Mood::Happy)); // sticky: still angry
//! assert_eq!(tracker.current(), Mood::Angry);
//!
//! tracker.observe(None);
//! assert!(tracker.trend());
//!
//! tracker.reset_to_neutral();
//! assert_eq!(tracker.current(), Mood::Neutral);
//! ```

use std::collections::VecDeque;

use catia_types::Mood;
use serde::{Deserialize, Serialize};

use crate::config::MoodKeywords;

/// Number of past moods retained.
pub const MOOD_HISTORY_LIMIT: usize = 5;

/// Trailing identical entries needed for [`MoodTracker::trend`].
pub const TREND_WINDOW: usize = 3;

/// The sticky transition function.
pub fn transition(state: Mood, detected: Option<Mood>) -> Mood {
    if !state.is_neutral() {
        return state;
    }
    detected.unwrap_or(Mood::Neutral)
}

// ─────────────────────────────────────────────────────────────────────────────
// MoodTracker
// ─────────────────────────────────────────────────────────────────────────────

/// Bounded history of moods, newest last.  Serializes as a plain array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoodTracker {
    history: VecDeque<Mood>,
}

impl MoodTracker {
    /// Append `mood`, evicting the oldest entry beyond the limit.
    pub fn push(&mut self, mood: Mood) {
        self.history.push_back(mood);
        self.enforce_limit();
    }

    /// Apply [`transition`] from the current state and record the result.
    pub fn observe(&mut self, detected: Option<Mood>) -> Mood {
        let next = transition(self.current(), detected);
        self.push(next);
        next
    }

    pub fn reset_to_neutral(&mut self) {
        self.push(Mood::Neutral);
    }

    /// Most recent mood, `neutral` when nothing has been recorded.
    pub fn current(&self) -> Mood {
        self.history.back().copied().unwrap_or_default()
    }

    /// `true` when the last [`TREND_WINDOW`] entries are identical.
    pub fn trend(&self) -> bool {
        if self.history.len() < TREND_WINDOW {
            return false;
        }
        let current = self.current();
        self.history.iter().rev().take(TREND_WINDOW).all(|&m| m == current)
    }

    pub fn history(&self) -> impl Iterator<Item = Mood> + '_ {
        self.history.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Trim a history loaded from an older or hand-edited file.
    pub(crate) fn enforce_limit(&mut self) {
        while self.history.len() > MOOD_HISTORY_LIMIT {
            self.history.pop_front();
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MoodDetector
// ─────────────────────────────────────────────────────────────────────────────

/// Keyword-based signal detector for callers.  Moods are tried in the order
/// angry, sad, horny, happy; the first with a contained keyword wins.
#[derive(Debug, Clone, Default)]
pub struct MoodDetector {
    keywords: MoodKeywords,
}

impl MoodDetector {
    const ORDER: [Mood; 4] = [Mood::Angry, Mood::Sad, Mood::Horny, Mood::Happy];

    pub fn new(keywords: MoodKeywords) -> Self {
        Self { keywords }
    }

    pub fn detect(&self, text: &str) -> Option<Mood> {
        let lowered = text.to_lowercase();
        Self::ORDER.into_iter().find(|&mood| {
            self.keywords
                .for_mood(mood)
                .iter()
                .any(|kw| !kw.is_empty() && lowered.contains(&kw.to_lowercase()))
        })
    }
}
