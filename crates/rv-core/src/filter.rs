//! Whitelist pattern compilation and URL matching
//!
//! Each whitelist entry is an independent regular expression. Entries that
//! fail to compile are dropped from the matcher but must stay in the raw
//! list the user edits, so validation is a separate, per-pattern step.

use regex::{Regex, RegexSet};

/// Outcome of validating a single raw pattern.
#[derive(Debug)]
pub enum PatternValidation {
    /// The pattern compiles; the string is usable as-is.
    Valid(String),
    /// The pattern is not a valid regular expression.
    Invalid {
        pattern: String,
        error: regex::Error,
    },
}

impl PatternValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, PatternValidation::Valid(_))
    }
}

/// Validate one raw whitelist pattern.
pub fn validate_pattern(pattern: &str) -> PatternValidation {
    match Regex::new(pattern) {
        Ok(_) => PatternValidation::Valid(pattern.to_string()),
        Err(error) => PatternValidation::Invalid {
            pattern: pattern.to_string(),
            error,
        },
    }
}

/// A compiled whitelist: the OR-combination of every valid pattern.
///
/// Compilation is a pure function of the input list. Match results are
/// order-independent since alternation is commutative for match/no-match.
#[derive(Debug, Default)]
pub struct Matcher {
    // None when no pattern survived validation. An empty RegexSet would
    // report no match too, but the empty whitelist must short-circuit
    // explicitly rather than lean on alternation edge cases.
    set: Option<RegexSet>,
    dropped: usize,
}

impl Matcher {
    /// Compile a raw pattern list, silently dropping invalid entries.
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Matcher {
        let mut valid = Vec::with_capacity(patterns.len());
        let mut dropped = 0usize;

        for pattern in patterns {
            match validate_pattern(pattern.as_ref()) {
                PatternValidation::Valid(p) => valid.push(p),
                PatternValidation::Invalid { pattern, error } => {
                    log::warn!("dropping invalid whitelist pattern '{pattern}': {error}");
                    dropped += 1;
                }
            }
        }

        if valid.is_empty() {
            return Matcher { set: None, dropped };
        }

        let set = match RegexSet::new(&valid) {
            Ok(set) => Some(set),
            Err(error) => {
                // Each pattern compiled on its own, so this only fires on
                // aggregate size limits. Treat the whole set as unusable.
                log::warn!("whitelist set failed to compile: {error}");
                dropped += valid.len();
                None
            }
        };

        Matcher { set, dropped }
    }

    /// True iff the URL matches at least one surviving pattern.
    pub fn is_match(&self, url: &str) -> bool {
        match &self.set {
            Some(set) => set.is_match(url),
            None => false,
        }
    }

    /// Number of surviving patterns.
    pub fn len(&self) -> usize {
        self.set.as_ref().map_or(0, RegexSet::len)
    }

    /// True when no pattern survived validation.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of raw patterns dropped during validation.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_matches_nothing() {
        let matcher = Matcher::compile::<&str>(&[]);
        assert!(matcher.is_empty());
        assert!(!matcher.is_match("https://example.com"));
        assert!(!matcher.is_match(""));
        assert!(!matcher.is_match("anything at all"));
    }

    #[test]
    fn union_of_patterns() {
        let a = Matcher::compile(&["^https://foo"]);
        let b = Matcher::compile(&["bar$"]);
        let both = Matcher::compile(&["^https://foo", "bar$"]);

        for url in [
            "https://foo/x",
            "https://other/bar",
            "https://foo/bar",
            "https://neither/",
        ] {
            assert_eq!(
                both.is_match(url),
                a.is_match(url) || b.is_match(url),
                "union property failed for {url}"
            );
        }
    }

    #[test]
    fn invalid_pattern_does_not_disturb_valid_ones() {
        let clean = Matcher::compile(&["^https://example\\.com"]);
        let mixed = Matcher::compile(&["bad(", "^https://example\\.com"]);

        assert_eq!(mixed.len(), 1);
        assert_eq!(mixed.dropped(), 1);
        for url in ["https://example.com/page", "https://elsewhere.net"] {
            assert_eq!(clean.is_match(url), mixed.is_match(url));
        }
    }

    #[test]
    fn all_invalid_behaves_like_empty() {
        let matcher = Matcher::compile(&["bad(", "also[bad"]);
        assert!(matcher.is_empty());
        assert_eq!(matcher.dropped(), 2);
        assert!(!matcher.is_match("https://example.com"));
    }

    #[test]
    fn validate_pattern_discriminates() {
        assert!(validate_pattern("^https://").is_valid());
        match validate_pattern("bad(") {
            PatternValidation::Invalid { pattern, .. } => assert_eq!(pattern, "bad("),
            PatternValidation::Valid(_) => panic!("'bad(' should not validate"),
        }
    }

    #[test]
    fn match_is_order_independent() {
        let ab = Matcher::compile(&["foo", "bar"]);
        let ba = Matcher::compile(&["bar", "foo"]);
        for url in ["https://foo", "https://bar", "https://baz"] {
            assert_eq!(ab.is_match(url), ba.is_match(url));
        }
    }
}
