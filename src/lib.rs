//! # clause-guard
//!
//! Sanitization and qualification of free-form SQL WHERE fragments.
//!
//! Generated CRUD queries often accept a WHERE fragment from upstream code
//! (filters, scopes, relation loaders). This crate makes such a fragment safe
//! and unambiguous before it is spliced into a query for a given main table.
//!
//! ## Features
//!
//! - **Injection Rejection**: Fragments mentioning DML/DDL verbs (`DROP`, `DELETE`, ...) are dropped whole
//! - **Trivial Condition Removal**: `1=1`, `true` and friends are stripped from AND chains
//! - **Prefix Correction**: References qualified with an unknown table are re-pointed at the main table
//! - **Column Qualification**: Bare column names get the main table as prefix
//! - **Column Catalog**: Valid columns can be loaded from PostgreSQL's `information_schema`
//! - **Never Fails**: Every clause operation returns a string; `""` means "omit the fragment"
//!
//! ## Quick Start
//!
//! ```rust
//! use clause_guard::{AllowedPrefixes, ColumnCatalog, Sanitizer, SanitizerConfig};
//!
//! let catalog = ColumnCatalog::new().with_table("users", ["id", "status", "age"]);
//! let sanitizer = Sanitizer::new(SanitizerConfig::default(), catalog).unwrap();
//!
//! let allowed = AllowedPrefixes::for_table("users").with("profile");
//!
//! // Wrong prefix corrected, trivial condition dropped
//! assert_eq!(
//!     sanitizer.sanitize("u.status = 'active' AND 1=1", "users", &allowed),
//!     "users.status = 'active'"
//! );
//!
//! // Injection rejected
//! assert_eq!(sanitizer.sanitize("a = 1; DROP TABLE users", "users", &allowed), "");
//!
//! // Bare columns qualified
//! assert_eq!(
//!     sanitizer.prepare("(status = 'a' OR status = 'b')", "users", &allowed),
//!     "(users.status = 'a' OR users.status = 'b')"
//! );
//! ```
//!
//! ## Configuration
//!
//! The sanitizer is configured using `SanitizerConfig`:
//!
//! ```rust
//! use clause_guard::SanitizerConfig;
//!
//! let config = SanitizerConfig::builder()
//!     .database_url("postgres://localhost/mydb") // Only needed for Sanitizer::connect
//!     .catalog_schema("public")                  // Schema the catalog is loaded from (default)
//!     .deny_keyword("merge")                     // Reject extra keywords
//!     .log_rejections(true)                      // WARN on rejected fragments (default)
//!     .build();
//! ```
//!
//! ## Column Oracles
//!
//! Column validity comes from a [`ColumnOracle`]. A [`ColumnCatalog`] is the
//! usual choice; closures and [`UnknownColumns`] work too. When the oracle does
//! not know a table, every column of it is assumed valid.

pub mod catalog;
pub mod config;
pub mod error;
pub mod oracle;
pub mod sanitizer;
pub mod sql;
pub mod types;

// Re-export main types for convenience
pub use catalog::ColumnCatalog;
pub use config::{SanitizerConfig, SanitizerConfigBuilder};
pub use error::{Result, SanitizeError};
pub use oracle::{ColumnOracle, ColumnSet, UnknownColumns, column_is_valid};
pub use sanitizer::Sanitizer;
pub use types::{AllowedPrefixes, ColumnRef, PrefixRewrite, SanitizeReport};

// Re-export the clause operations for callers without a Sanitizer
pub use sql::clause::{qualify_clause, sanitize_and_qualify, sanitize_clause, sanitize_with_denylist};
pub use sql::security::{Denylist, validate_security};
