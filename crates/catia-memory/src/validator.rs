//! [`ResponseValidator`] – write gate for learned responses.
//!
//! Before a response enters storage, pass it through
//! [`ResponseValidator::validate`].  Every registered [`ResponseRule`] is
//! evaluated in order; the first failure returns a [`RejectReason`] and the
//! write is **not** performed.
//!
//! Two built-in rules are provided:
//! - [`NonBlankRule`] – rejects empty and whitespace-only text.
//! - [`DenyListRule`] – rejects text that, once trimmed, exactly equals a
//!   deny-listed boilerplate string.

use std::collections::HashSet;

use catia_types::RejectReason;
use tracing::debug;

// ────────────────────────────────────────────────────────────────────────────
// Rule trait
// ────────────────────────────────────────────────────────────────────────────

/// A single acceptance criterion for a response.
pub trait ResponseRule: Send + Sync {
    /// Human-readable name used in log lines.
    fn name(&self) -> &str;

    /// Return `Ok(())` when `text` may be stored.
    fn check(&self, text: &str) -> Result<(), RejectReason>;
}

// ────────────────────────────────────────────────────────────────────────────
// ResponseValidator
// ────────────────────────────────────────────────────────────────────────────

/// Rule engine deciding whether a response is worth remembering.
///
/// # Example
///
/// ```
/// use catia_memory::validator::ResponseValidator;
///
/// let validator = ResponseValidator::with_deny_list(["No relevant results found."]);
/// assert!(validator.is_acceptable("Hey there!"));
/// assert!(!validator.is_acceptable("   "));
/// assert!(!validator.is_acceptable(" No relevant results found. "));
/// ```
#[derive(Default)]
pub struct ResponseValidator {
    rules: Vec<Box<dyn ResponseRule>>,
}

impl ResponseValidator {
    /// Create an empty validator that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard gate: [`NonBlankRule`] followed by a [`DenyListRule`].
    pub fn with_deny_list<I, S>(deny_list: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut validator = Self::new();
        validator.add_rule(Box::new(NonBlankRule));
        validator.add_rule(Box::new(DenyListRule::new(deny_list)));
        validator
    }

    /// Register a new rule.  Rules are evaluated in insertion order.
    pub fn add_rule(&mut self, rule: Box<dyn ResponseRule>) {
        self.rules.push(rule);
    }

    /// Return the first rejection encountered, or `Ok(())` when every rule
    /// passes.
    pub fn validate(&self, text: &str) -> Result<(), RejectReason> {
        for rule in &self.rules {
            if let Err(reason) = rule.check(text) {
                debug!(rule = rule.name(), %reason, "Response rejected");
                return Err(reason);
            }
        }
        Ok(())
    }

    pub fn is_acceptable(&self, text: &str) -> bool {
        self.validate(text).is_ok()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Built-in rules
// ────────────────────────────────────────────────────────────────────────────

pub struct NonBlankRule;

impl ResponseRule for NonBlankRule {
    fn name(&self) -> &str {
        "non_blank"
    }

    fn check(&self, text: &str) -> Result<(), RejectReason> {
        if text.trim().is_empty() {
            Err(RejectReason::Blank)
        } else {
            Ok(())
        }
    }
}

/// Rejects known low-information boilerplate.  Matching is exact after
/// trimming both sides; it is case-sensitive.
pub struct DenyListRule {
    denied: HashSet<String>,
}

impl DenyListRule {
    pub fn new<I, S>(deny_list: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            denied: deny_list
                .into_iter()
                .map(|s| {
                    let s: String = s.into();
                    s.trim().to_string()
                })
                .collect(),
        }
    }
}

impl ResponseRule for DenyListRule {
    fn name(&self) -> &str {
        "deny_list"
    }

    fn check(&self, text: &str) -> Result<(), RejectReason> {
        let trimmed = text.trim();
        if self.denied.contains(trimmed) {
            Err(RejectReason::DenyListed(trimmed.to_string()))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_DENY_LIST;

    fn default_validator() -> ResponseValidator {
        ResponseValidator::with_deny_list(DEFAULT_DENY_LIST)
    }

    #[test]
    fn accepts_ordinary_text() {
        assert!(default_validator().is_acceptable("Hey there!"));
    }

    #[test]
    fn rejects_blank_text() {
        let v = default_validator();
        assert_eq!(v.validate(""), Err(RejectReason::Blank));
        assert_eq!(v.validate(" \t\n"), Err(RejectReason::Blank));
    }

    #[test]
    fn rejects_every_default_boilerplate() {
        let v = default_validator();
        for text in DEFAULT_DENY_LIST {
            assert!(!v.is_acceptable(text), "{text:?} should be rejected");
        }
    }

    #[test]
    fn deny_list_match_is_after_trim() {
        let v = default_validator();
        assert_eq!(
            v.validate("  None \n"),
            Err(RejectReason::DenyListed("None".to_string()))
        );
    }

    #[test]
    fn deny_list_is_exact_not_substring() {
        let v = default_validator();
        assert!(v.is_acceptable("None of your business"));
        assert!(v.is_acceptable("none"));
    }

    #[test]
    fn empty_validator_accepts_anything() {
        assert!(ResponseValidator::new().is_acceptable(""));
    }

    #[test]
    fn rules_evaluated_in_insertion_order() {
        struct AlwaysDeny;
        impl ResponseRule for AlwaysDeny {
            fn name(&self) -> &str {
                "always_deny"
            }
            fn check(&self, text: &str) -> Result<(), RejectReason> {
                Err(RejectReason::DenyListed(text.to_string()))
            }
        }
        let mut v = ResponseValidator::new();
        v.add_rule(Box::new(NonBlankRule));
        v.add_rule(Box::new(AlwaysDeny));
        assert_eq!(v.validate(""), Err(RejectReason::Blank));
        assert_eq!(v.validate("x"), Err(RejectReason::DenyListed("x".to_string())));
    }
}
