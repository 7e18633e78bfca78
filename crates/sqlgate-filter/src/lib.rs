//! SqlGate Filter - Wildcard allow/deny filtering of database names.
//!
//! The operator restricts which downstream database names are visible and
//! selectable with include/exclude wildcard pattern sets. Precedence is
//! deterministic: a name matching any exclude pattern is denied no matter
//! what the include set says; an empty include set means "everything not
//! excluded".
//!
//! # Example
//!
//! ```rust
//! use sqlgate_filter::DatabaseNameFilter;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let filter = DatabaseNameFilter::new(&["Sales*".to_string()], &["SalesArchive".to_string()])?;
//! assert!(filter.is_allowed("Sales2024"));
//! assert!(!filter.is_allowed("SalesArchive"));
//! assert!(!filter.is_allowed("Inventory"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod wildcard;

pub use wildcard::{filter_allow_deny, WildcardPattern};

use sqlgate_core::config::PolicyConfig;
use thiserror::Error;

/// Errors raised while compiling wildcard patterns.
///
/// These are operator-input format errors and fail fast at load time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// The pattern could not be compiled
    #[error("invalid wildcard pattern: {0}")]
    InvalidPattern(String),
}

/// Result type for filter construction.
pub type Result<T> = std::result::Result<T, FilterError>;

/// Filters database names with configured include/exclude pattern sets.
///
/// Patterns are case-insensitive and deduplicated (ignoring case) at
/// construction.
#[derive(Debug, Clone, Default)]
pub struct DatabaseNameFilter {
    include: Vec<WildcardPattern>,
    exclude: Vec<WildcardPattern>,
}

impl DatabaseNameFilter {
    /// Build a filter from raw include/exclude pattern text.
    ///
    /// Blank entries are skipped; duplicate patterns (ignoring case) are
    /// collapsed.
    ///
    /// # Errors
    /// Fails fast with `FilterError::InvalidPattern` naming the offending
    /// pattern.
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        Ok(Self {
            include: compile_set(include)?,
            exclude: compile_set(exclude)?,
        })
    }

    /// Build a filter from the policy section of the configuration.
    pub fn from_config(policy: &PolicyConfig) -> Result<Self> {
        Self::new(&policy.include_databases, &policy.exclude_databases)
    }

    /// Whether any restriction is configured at all.
    #[must_use]
    pub fn is_restrictive(&self) -> bool {
        !self.include.is_empty() || !self.exclude.is_empty()
    }

    /// Whether a single database name is allowed.
    ///
    /// Blank names are never allowed.
    #[must_use]
    pub fn is_allowed(&self, name: &str) -> bool {
        if name.trim().is_empty() {
            return false;
        }
        !self.list_allowed([name]).is_empty()
    }

    /// Filter a list of database names, preserving input order.
    pub fn list_allowed<I, S>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        filter_allow_deny(names, &self.include, &self.exclude)
    }
}

/// Compile a pattern set, skipping blanks and case-insensitive duplicates.
fn compile_set(patterns: &[String]) -> Result<Vec<WildcardPattern>> {
    let mut seen: Vec<String> = Vec::new();
    let mut compiled = Vec::new();

    for text in patterns {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        let folded = trimmed.to_lowercase();
        if seen.contains(&folded) {
            tracing::debug!("Skipping duplicate pattern {trimmed}");
            continue;
        }
        seen.push(folded);
        compiled.push(WildcardPattern::compile(trimmed)?);
    }

    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(include: &[&str], exclude: &[&str]) -> DatabaseNameFilter {
        let include: Vec<String> = include.iter().map(ToString::to_string).collect();
        let exclude: Vec<String> = exclude.iter().map(ToString::to_string).collect();
        DatabaseNameFilter::new(&include, &exclude).expect("valid test filter")
    }

    #[test]
    fn test_unrestricted_allows_everything_nonblank() {
        let f = filter(&[], &[]);
        assert!(!f.is_restrictive());
        assert!(f.is_allowed("anything"));
        assert!(!f.is_allowed(""));
        assert!(!f.is_allowed("   "));
    }

    #[test]
    fn test_deny_wins_over_allow() {
        let f = filter(&["*"], &["SecretDB"]);
        assert!(f.is_allowed("sales"));
        assert!(!f.is_allowed("SecretDB"));
        // Case-insensitive: the deny hits regardless of case
        assert!(!f.is_allowed("secretdb"));
    }

    #[test]
    fn test_include_set_restricts() {
        let f = filter(&["Sales*", "Inventory"], &[]);
        assert!(f.is_allowed("Sales2024"));
        assert!(f.is_allowed("inventory"));
        assert!(!f.is_allowed("master"));
    }

    #[test]
    fn test_list_allowed_preserves_order() {
        let f = filter(&[], &["tempdb"]);
        let allowed = f.list_allowed(["master", "tempdb", "model", "msdb"]);
        assert_eq!(allowed, vec!["master", "model", "msdb"]);
    }

    #[test]
    fn test_case_insensitive_dedup() {
        let f = filter(&["Sales", "SALES", "sales"], &[]);
        assert_eq!(f.include.len(), 1);
    }

    #[test]
    fn test_from_config() {
        let policy = PolicyConfig {
            include_databases: vec!["app_*".to_string()],
            exclude_databases: vec!["app_audit".to_string()],
            ..PolicyConfig::default()
        };
        let f = DatabaseNameFilter::from_config(&policy).expect("valid config");
        assert!(f.is_allowed("app_sales"));
        assert!(!f.is_allowed("app_audit"));
        assert!(!f.is_allowed("other"));
    }
}
