//! Core type definitions for clause sanitization
//!
//! Includes the allowed-prefix set, column references and the sanitize report.

use serde::{Deserialize, Serialize};

// ============================================================================
// Allowed Prefixes
// ============================================================================

/// Qualifiers that are legitimate in a query context
///
/// Holds the main table plus any preloaded relation names and join aliases.
/// Insertion order is kept, duplicates are ignored, and membership is
/// case-insensitive like unquoted SQL identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedPrefixes {
    prefixes: Vec<String>,
}

impl AllowedPrefixes {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set containing only the main table
    pub fn for_table(table_name: impl Into<String>) -> Self {
        Self::new().with(table_name)
    }

    /// Add a relation name or alias
    pub fn with(mut self, prefix: impl Into<String>) -> Self {
        self.insert(prefix);
        self
    }

    /// Add a relation name or alias in place; returns false if already present
    pub fn insert(&mut self, prefix: impl Into<String>) -> bool {
        let prefix = prefix.into();
        if prefix.is_empty() || self.contains(&prefix) {
            return false;
        }
        self.prefixes.push(prefix);
        true
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.prefixes.iter().any(|p| p.eq_ignore_ascii_case(prefix))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.prefixes.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for AllowedPrefixes {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for prefix in iter {
            set.insert(prefix);
        }
        set
    }
}

// ============================================================================
// Column References
// ============================================================================

/// A `prefix.column` reference found on the left of a condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRef {
    /// Table, alias or `schema.table` before the last dot
    pub prefix: String,
    /// Column name after the last dot
    pub column: String,
}

impl ColumnRef {
    pub fn new(prefix: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            column: column.into(),
        }
    }

    /// The reference as written: `prefix.column`
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.prefix, self.column)
    }
}

// ============================================================================
// Sanitize Report
// ============================================================================

/// One prefix correction performed by sanitize
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixRewrite {
    /// Reference before the rewrite, e.g. `wrong.status`
    pub from: String,
    /// Reference after the rewrite, e.g. `users.status`
    pub to: String,
}

/// Outcome of sanitizing a clause, with what was changed along the way
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizeReport {
    /// Sanitized clause; empty means "no restriction"
    pub clause: String,
    /// Keyword that caused the whole clause to be discarded
    #[serde(rename = "rejectedKeyword", skip_serializing_if = "Option::is_none")]
    pub rejected_keyword: Option<String>,
    /// Trivial conditions that were removed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropped: Vec<String>,
    /// Prefix corrections that were applied
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rewrites: Vec<PrefixRewrite>,
}

impl SanitizeReport {
    /// Report for a clause discarded because of `keyword`
    pub fn rejected(keyword: impl Into<String>) -> Self {
        Self {
            rejected_keyword: Some(keyword.into()),
            ..Self::default()
        }
    }

    pub fn is_rejected(&self) -> bool {
        self.rejected_keyword.is_some()
    }

    /// Whether the sanitized clause carries no restriction
    pub fn is_empty(&self) -> bool {
        self.clause.is_empty()
    }
}
