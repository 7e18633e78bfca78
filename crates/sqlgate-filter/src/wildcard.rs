//! Wildcard pattern compilation and matching.
//!
//! Patterns use `*` for any run of characters and `_` for any single
//! character; everything else is literal. Matching is whole-string
//! (implicit anchors) and case-insensitive by default.

use crate::{FilterError, Result};
use regex::RegexBuilder;
use std::fmt;

/// A compiled wildcard pattern.
#[derive(Clone)]
pub struct WildcardPattern {
    pattern: String,
    regex: regex::Regex,
}

impl WildcardPattern {
    /// Compile a pattern with case-insensitive matching.
    ///
    /// # Errors
    /// Returns `FilterError::InvalidPattern` naming the pattern if it
    /// cannot be compiled.
    pub fn compile(pattern: &str) -> Result<Self> {
        Self::compile_with(pattern, false)
    }

    /// Compile a pattern, choosing case sensitivity.
    pub fn compile_with(pattern: &str, case_sensitive: bool) -> Result<Self> {
        // Escape regex metacharacters first, then translate the wildcards.
        // `*` is escaped to `\*` and `_` passes through untouched.
        let translated = format!(
            "^{}$",
            regex::escape(pattern).replace("\\*", ".*").replace('_', ".")
        );

        let regex = RegexBuilder::new(&translated)
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|_| FilterError::InvalidPattern(pattern.to_string()))?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// The original pattern text.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether `name` matches this pattern in its entirety.
    #[must_use]
    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

impl fmt::Debug for WildcardPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WildcardPattern").field(&self.pattern).finish()
    }
}

/// Filter `names` with deny-overrides-allow precedence.
///
/// A name is kept iff it matches no deny pattern AND the allow set is
/// empty or it matches at least one allow pattern. Input order is
/// preserved.
#[must_use]
pub fn filter_allow_deny<I, S>(
    names: I,
    allow: &[WildcardPattern],
    deny: &[WildcardPattern],
) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names
        .into_iter()
        .map(Into::into)
        .filter(|name| {
            if deny.iter().any(|p| p.is_match(name)) {
                return false;
            }
            allow.is_empty() || allow.iter().any(|p| p.is_match(name))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(text: &str) -> WildcardPattern {
        WildcardPattern::compile(text).expect("valid test pattern")
    }

    fn patterns(texts: &[&str]) -> Vec<WildcardPattern> {
        texts.iter().map(|t| pattern(t)).collect()
    }

    #[test]
    fn test_star_matches_any_run() {
        let p = pattern("a*e");
        assert!(p.is_match("apple"));
        assert!(p.is_match("ae"));
        assert!(!p.is_match("apricot"));
        assert!(!p.is_match("grape"));
    }

    #[test]
    fn test_underscore_matches_single_character() {
        let p = pattern("d_ta");
        assert!(p.is_match("data"));
        assert!(p.is_match("dota"));
        assert!(!p.is_match("dxxta"));
        assert!(!p.is_match("dta"));
    }

    #[test]
    fn test_whole_string_anchored() {
        let p = pattern("sales");
        assert!(p.is_match("sales"));
        assert!(!p.is_match("presales"));
        assert!(!p.is_match("salesdb"));
    }

    #[test]
    fn test_case_insensitive_by_default() {
        let p = pattern("Sales*");
        assert!(p.is_match("SALES_2024"));
        assert!(p.is_match("sales_2024"));
    }

    #[test]
    fn test_case_sensitive_option() {
        let p = WildcardPattern::compile_with("Sales", true).expect("compile");
        assert!(p.is_match("Sales"));
        assert!(!p.is_match("sales"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let p = pattern("db.prod+x");
        assert!(p.is_match("db.prod+x"));
        assert!(!p.is_match("dbxprod+x"));
        assert!(!p.is_match("db.prodd+x"));
    }

    #[test]
    fn test_filter_match_set() {
        let names = ["apple", "apricot", "banana", "grape"];
        let allowed = filter_allow_deny(names, &patterns(&["a*e"]), &[]);
        assert_eq!(allowed, vec!["apple"]);
    }

    #[test]
    fn test_deny_overrides_allow() {
        let names = ["SecretDB", "sales", "inventory"];
        let allowed = filter_allow_deny(names, &patterns(&["*"]), &patterns(&["SecretDB"]));
        assert_eq!(allowed, vec!["sales", "inventory"]);
    }

    #[test]
    fn test_empty_allow_keeps_all_non_denied() {
        let names = ["master", "tempdb", "sales"];
        let allowed = filter_allow_deny(names, &[], &patterns(&["tempdb"]));
        assert_eq!(allowed, vec!["master", "sales"]);
    }

    #[test]
    fn test_input_order_preserved() {
        let names = ["zebra", "apple", "mango"];
        let allowed = filter_allow_deny(names, &[], &[]);
        assert_eq!(allowed, vec!["zebra", "apple", "mango"]);
    }
}
