//! Error types for clause sanitization

use thiserror::Error;

/// Errors that can occur while configuring the sanitizer or loading its catalog
///
/// The clause operations themselves never fail: a rejected clause becomes an
/// empty string. `SecurityRejected` is what the validator reports internally.
#[derive(Debug, Error)]
pub enum SanitizeError {
    #[error("Clause rejected: contains forbidden keyword '{keyword}'")]
    SecurityRejected { keyword: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SanitizeError {
    pub fn security_rejected(keyword: impl Into<String>) -> Self {
        Self::SecurityRejected {
            keyword: keyword.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// The offending keyword, if this is a security rejection
    pub fn rejected_keyword(&self) -> Option<&str> {
        match self {
            Self::SecurityRejected { keyword } => Some(keyword),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SanitizeError>;
