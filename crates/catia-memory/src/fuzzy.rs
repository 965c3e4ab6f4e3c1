//! Fuzzy Matcher – approximate search over stored inputs.
//!
//! Similarity is the character diff ratio from [`similar`]
//!
//! ```text
//! ratio(a, b) = 2 · matched(a, b) / (|a| + |b|)
//! ```
//!
//! computed over Unicode scalar values.  It is `1.0` for identical strings
//! (including two empty ones) and `0.0` when nothing is shared.
//!
//! # Example
//!
//! ```rust
//! use catia_memory::fuzzy::FuzzyMatcher;
//!
//! let matcher = FuzzyMatcher::default();
//! let hits = matcher.find_similar("helo there", ["hello there", "goodbye"]);
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].candidate, "hello there");
//! ```

use similar::TextDiff;

use crate::config::FuzzyConfig;

/// One candidate that cleared the similarity threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyMatch<'a> {
    pub candidate: &'a str,
    /// Similarity ratio in `[0, 1]`.
    pub score: f64,
}

/// Ranks candidates by [`similarity`] to a query.
#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
    max_results: usize,
    min_similarity: f64,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::from(&FuzzyConfig::default())
    }
}

impl From<&FuzzyConfig> for FuzzyMatcher {
    fn from(cfg: &FuzzyConfig) -> Self {
        Self::new(cfg.max_results, cfg.min_similarity)
    }
}

impl FuzzyMatcher {
    /// `min_similarity` is clamped to `[0, 1]`.
    pub fn new(max_results: usize, min_similarity: f64) -> Self {
        Self {
            max_results,
            min_similarity: min_similarity.clamp(0.0, 1.0),
        }
    }

    /// Return at most `max_results` candidates scoring at least
    /// `min_similarity`, best first.  Equal scores keep candidate order.
    pub fn find_similar<'a, I>(&self, query: &str, candidates: I) -> Vec<FuzzyMatch<'a>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        if self.max_results == 0 {
            return Vec::new();
        }
        let mut hits: Vec<FuzzyMatch<'a>> = candidates
            .into_iter()
            .filter_map(|candidate| {
                let score = similarity(query, candidate);
                (score >= self.min_similarity).then_some(FuzzyMatch { candidate, score })
            })
            .collect();
        // `sort_by` is stable, which preserves candidate order on ties.
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(self.max_results);
        hits
    }
}

/// Character-level diff ratio in `[0, 1]`: twice the matched characters
/// over the combined length.
pub fn similarity(a: &str, b: &str) -> f64 {
    f64::from(TextDiff::from_chars(a, b).ratio())
}
