//! Column reference extraction
//!
//! Works on a single condition and only looks at its left operand: the text
//! before the leftmost top-level comparison operator.

use std::sync::LazyLock;

use regex::Regex;

use crate::sql::scanner::{find_comparison_operator, is_identifier_byte};
use crate::types::ColumnRef;

/// A plain unquoted SQL identifier
pub(crate) static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").expect("identifier pattern is valid")
});

/// Words that can start a condition without being a column
const NON_COLUMN_KEYWORDS: &[&str] = &[
    "select", "from", "where", "and", "or", "not", "in", "is", "null", "true", "false", "like",
    "between", "exists",
];

/// Return the left operand of a condition, without identifier quotes
///
/// Falls back to the first whitespace token when there is no top-level
/// operator, so a bare boolean column such as `active` is still found.
///
/// # Example
/// ```
/// use clause_guard::sql::reference::extract_left_operand;
///
/// assert_eq!(extract_left_operand("t.status = 'a'").as_deref(), Some("t.status"));
/// assert_eq!(extract_left_operand("active").as_deref(), Some("active"));
/// assert_eq!(extract_left_operand("NOT active"), None);
/// ```
pub fn extract_left_operand(cond: &str) -> Option<String> {
    let cond = cond.trim();

    let left = match find_comparison_operator(cond) {
        Some((index, _)) => cond.get(..index)?.trim(),
        None => {
            let token = cond.split_whitespace().next()?;
            if NON_COLUMN_KEYWORDS.contains(&token.to_lowercase().as_str()) {
                return None;
            }
            token
        }
    };

    let unquoted: String = left.chars().filter(|c| *c != '"' && *c != '`').collect();
    if unquoted.is_empty() {
        None
    } else {
        Some(unquoted)
    }
}

/// Whether the left operand is already qualified with a prefix
pub fn has_existing_prefix(cond: &str) -> bool {
    extract_left_operand(cond).is_some_and(|left| left.contains('.'))
}

/// Extract the `(prefix, column)` pair from the left operand of a condition
///
/// Function wrappers are seen through: in `coalesce(t.col, 0) = 1` the
/// reference inside the call is returned.
pub fn extract_table_and_column(cond: &str) -> Option<ColumnRef> {
    let left = extract_left_operand(cond)?;
    column_ref_from_operand(&left)
}

fn column_ref_from_operand(operand: &str) -> Option<ColumnRef> {
    let Some(paren) = operand.find('(') else {
        return split_last_dot(operand);
    };

    let after_paren = paren + 1;
    let dot = after_paren + operand.get(after_paren..)?.find('.')?;
    let bytes = operand.as_bytes();
    let is_reference_byte = |b: u8| is_identifier_byte(b) || b == b'.';

    // Back to the enclosing `(`, `,` or whitespace
    let mut start = dot;
    while start > 0 && bytes.get(start - 1).is_some_and(|&b| is_reference_byte(b)) {
        start -= 1;
    }

    // Forward to the next `,`, `)` or whitespace
    let mut end = dot + 1;
    while bytes.get(end).is_some_and(|&b| is_reference_byte(b)) {
        end += 1;
    }

    split_last_dot(operand.get(start..end)?)
}

/// Split `prefix.column` on the last dot; every segment must be an identifier
fn split_last_dot(reference: &str) -> Option<ColumnRef> {
    let (prefix, column) = reference.rsplit_once('.')?;
    if !IDENTIFIER.is_match(column) || !prefix.split('.').all(|s| IDENTIFIER.is_match(s)) {
        return None;
    }
    Some(ColumnRef::new(prefix, column))
}
