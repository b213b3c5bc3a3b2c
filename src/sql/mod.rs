//! SQL text utilities for WHERE fragments
//!
//! Provides the quote/paren-aware scanner, literal classification, the
//! keyword denylist, column-reference extraction and the clause operations
//! built on top of them.

pub mod clause;
pub mod literal;
pub mod reference;
pub mod scanner;
pub mod security;

pub use clause::{qualify_clause, sanitize_and_qualify, sanitize_clause, sanitize_with_denylist};
pub use literal::{is_sql_literal_expression, is_trivial_condition};
pub use reference::{extract_left_operand, extract_table_and_column, has_existing_prefix};
pub use security::{DENIED_KEYWORDS, Denylist, validate_security};
pub use scanner::{
    find_operator_outside_parens, split_top_level_and, split_top_level_or, strip_outer_parens,
};
