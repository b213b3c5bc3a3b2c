//! Keyword denylist for WHERE fragments
//!
//! A fragment that mentions a DML/DDL verb as a separate word is rejected as a
//! whole. Nothing is repaired: the caller gets an error and drops the fragment.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Result, SanitizeError};

/// Verbs that must never appear in a WHERE fragment
///
/// `execute` is listed before `exec` so the reported keyword is the full word.
pub const DENIED_KEYWORDS: &[&str] = &[
    "delete", "update", "truncate", "drop", "alter", "create", "insert", "grant", "revoke",
    "execute", "exec",
];

/// Space, tab, newline, carriage return or semicolon, or the edge of the text
const SEPARATOR: &str = r"[ \t\n\r;]";

static DEFAULT_DENYLIST: LazyLock<Denylist> = LazyLock::new(Denylist::default);

static KEYWORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("keyword pattern is valid"));

/// Compiled denylist patterns
#[derive(Debug, Clone)]
pub struct Denylist {
    keywords: Vec<String>,
    /// keyword with a separator (or text edge) on both sides
    bounded: Regex,
    /// keyword glued to a preceding semicolon, whatever follows
    after_semicolon: Regex,
}

impl Denylist {
    /// Build a denylist from the fixed verbs plus `extra` keywords
    ///
    /// Extra keywords are lower-cased and must be plain words.
    pub fn with_extra<S: AsRef<str>>(extra: &[S]) -> Result<Self> {
        let mut keywords: Vec<String> = DENIED_KEYWORDS.iter().map(|k| k.to_string()).collect();

        for keyword in extra {
            let keyword = keyword.as_ref().trim().to_lowercase();
            validate_keyword(&keyword)?;
            if !keywords.contains(&keyword) {
                keywords.push(keyword);
            }
        }

        // Longer words first so `execute` is preferred over `exec`
        keywords.sort_by_key(|k| std::cmp::Reverse(k.len()));

        let (bounded, after_semicolon) = compile(&keywords)?;
        Ok(Self {
            keywords,
            bounded,
            after_semicolon,
        })
    }

    /// The shared built-in denylist
    pub fn builtin() -> &'static Denylist {
        &DEFAULT_DENYLIST
    }

    /// Keywords this denylist rejects
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Check a whole clause; the error names the first offending keyword found
    pub fn check(&self, clause: &str) -> Result<()> {
        let lower = clause.to_lowercase();

        let found = self
            .bounded
            .captures(&lower)
            .or_else(|| self.after_semicolon.captures(&lower))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());

        match found {
            Some(keyword) => Err(SanitizeError::security_rejected(keyword)),
            None => Ok(()),
        }
    }
}

impl Default for Denylist {
    fn default() -> Self {
        let keywords: Vec<String> = DENIED_KEYWORDS.iter().map(|k| k.to_string()).collect();
        let (bounded, after_semicolon) =
            compile(&keywords).expect("built-in denylist patterns are valid");
        Self {
            keywords,
            bounded,
            after_semicolon,
        }
    }
}

fn compile(keywords: &[String]) -> Result<(Regex, Regex)> {
    let alternation = keywords
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");

    let bounded = Regex::new(&format!(
        "(?:^|{SEPARATOR})({alternation})(?:$|{SEPARATOR})"
    ))?;
    let after_semicolon = Regex::new(&format!(";({alternation})"))?;

    Ok((bounded, after_semicolon))
}

/// Validate a configured keyword
///
/// Rules:
/// - Must start with a lowercase letter
/// - Can only contain lowercase letters, numbers, and underscores
pub fn validate_keyword(keyword: &str) -> Result<()> {
    if keyword.is_empty() {
        return Err(SanitizeError::validation("Denied keyword cannot be empty"));
    }

    if !KEYWORD_PATTERN.is_match(keyword) {
        return Err(SanitizeError::validation(format!(
            "Denied keyword '{}' is invalid. Must start with a lowercase letter and contain only lowercase letters, numbers, and underscores.",
            keyword
        )));
    }

    Ok(())
}

/// Reject the clause if it contains any built-in denied keyword
///
/// # Example
/// ```
/// use clause_guard::sql::security::validate_security;
///
/// assert!(validate_security("status = 'active'").is_ok());
/// assert!(validate_security("a=1; DROP TABLE x").is_err());
/// ```
pub fn validate_security(clause: &str) -> Result<()> {
    Denylist::builtin().check(clause)
}
