//! Category Classifier – keyword rules with fixed precedence.
//!
//! Every input maps to exactly one [`Category`].  Keyword tests are
//! case-insensitive substring checks evaluated in [`Category::ALL`] order, so
//! `"tell me a funny fact"` lands in `jokes` (checked before `facts`) and
//! anything that matches nothing falls back to `casual`.
//!
//! ```rust
//! use catia_memory::classifier::Classifier;
//! use catia_types::Category;
//!
//! let classifier = Classifier::default();
//! assert_eq!(classifier.classify("You look gorgeous"), Category::Flirtation);
//! assert_eq!(classifier.classify("What is rust?"), Category::Facts);
//! assert_eq!(classifier.classify(""), Category::Casual);
//! ```

use catia_types::Category;

use crate::config::CategoryKeywords;

#[derive(Debug, Clone, Default)]
pub struct Classifier {
    keywords: CategoryKeywords,
}

impl Classifier {
    pub fn new(keywords: CategoryKeywords) -> Self {
        Self { keywords }
    }

    /// Return the first category, in priority order, with a keyword contained
    /// in `text`.
    pub fn classify(&self, text: &str) -> Category {
        let lowered = text.to_lowercase();
        Category::ALL
            .into_iter()
            .find(|&category| {
                self.keywords
                    .for_category(category)
                    .iter()
                    .any(|kw| !kw.is_empty() && lowered.contains(&kw.to_lowercase()))
            })
            .unwrap_or(Category::Casual)
    }
}
