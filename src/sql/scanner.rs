//! Quote- and paren-aware scanning primitives
//!
//! Clauses are scanned as bytes. Every structural character the scanner cares
//! about (parens, quotes, comparison symbols, separators) is ASCII, so any
//! index where one of them matches is also a valid `char` boundary.

use std::ops::Range;

/// Comparison operators recognised at the top level of a condition.
///
/// Two-character symbols come before their one-character prefixes so that
/// `>=` wins over `>` when both match at the same position.
pub const COMPARISON_OPERATORS: &[&str] = &[
    "!=", "<>", ">=", "<=", "=", ">", "<", "LIKE", "IN", "IS",
];

const AND_SEPARATOR: &[u8] = b" and ";
const OR_SEPARATOR: &[u8] = b" or ";

/// Cursor state threaded through a left-to-right scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanState {
    /// Current parenthesis nesting depth
    pub depth: i32,
    /// Inside a `'...'` literal
    pub in_single_quote: bool,
    /// Inside a `"..."` quoted identifier
    pub in_double_quote: bool,
}

impl ScanState {
    /// Feed the byte at `index` into the state.
    ///
    /// Returns `true` if the byte was a structural character (quote or paren)
    /// that changed the state. Quotes preceded by a backslash are ignored, and
    /// each quote kind is ignored while inside the other.
    pub fn advance(&mut self, bytes: &[u8], index: usize) -> bool {
        let Some(&byte) = bytes.get(index) else {
            return false;
        };
        let escaped = index > 0 && bytes.get(index - 1) == Some(&b'\\');

        match byte {
            b'\'' if !self.in_double_quote && !escaped => {
                self.in_single_quote = !self.in_single_quote;
                true
            }
            b'"' if !self.in_single_quote && !escaped => {
                self.in_double_quote = !self.in_double_quote;
                true
            }
            b'(' if !self.in_quotes() => {
                self.depth += 1;
                true
            }
            b')' if !self.in_quotes() => {
                self.depth -= 1;
                true
            }
            _ => false,
        }
    }

    /// Depth-only variant of [`ScanState::advance`] that ignores quotes entirely
    pub fn advance_depth(&mut self, byte: u8) -> bool {
        match byte {
            b'(' => {
                self.depth += 1;
                true
            }
            b')' => {
                self.depth -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn in_quotes(&self) -> bool {
        self.in_single_quote || self.in_double_quote
    }

    /// Depth 0 and outside any quotes
    pub fn at_top_level(&self) -> bool {
        self.depth == 0 && !self.in_quotes()
    }
}

/// Bytes that can be part of an unquoted identifier (non-ASCII counts)
pub fn is_identifier_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$' || byte >= 0x80
}

/// Case-insensitive match of `pattern` at `index`
fn window_matches(bytes: &[u8], index: usize, pattern: &[u8]) -> bool {
    bytes
        .get(index..index + pattern.len())
        .is_some_and(|window| window.eq_ignore_ascii_case(pattern))
}

/// Whether `operator` matches at `index`; word operators need identifier boundaries
fn operator_matches_at(bytes: &[u8], index: usize, operator: &str) -> bool {
    let op = operator.as_bytes();
    if !window_matches(bytes, index, op) {
        return false;
    }

    let is_word = op.first().is_some_and(|b| b.is_ascii_alphabetic());
    if !is_word {
        return true;
    }

    let before_ok = index == 0
        || bytes
            .get(index - 1)
            .is_none_or(|&b| !is_identifier_byte(b));
    let after_ok = bytes
        .get(index + op.len())
        .is_none_or(|&b| !is_identifier_byte(b));

    before_ok && after_ok
}

/// Find the first index of `operator` at depth 0 outside quotes
///
/// # Example
/// ```
/// use clause_guard::sql::scanner::find_operator_outside_parens;
///
/// assert_eq!(find_operator_outside_parens("coalesce(a=1) = 2", "="), Some(14));
/// assert_eq!(find_operator_outside_parens("name = 'x=y'", "LIKE"), None);
/// ```
pub fn find_operator_outside_parens(text: &str, operator: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut state = ScanState::default();

    for index in 0..bytes.len() {
        if state.advance(bytes, index) {
            continue;
        }
        if state.at_top_level() && operator_matches_at(bytes, index, operator) {
            return Some(index);
        }
    }

    None
}

/// Find the leftmost top-level comparison operator of any kind
///
/// Returns the byte index and the canonical operator spelling.
pub fn find_comparison_operator(text: &str) -> Option<(usize, &'static str)> {
    let bytes = text.as_bytes();
    let mut state = ScanState::default();

    for index in 0..bytes.len() {
        if state.advance(bytes, index) {
            continue;
        }
        if !state.at_top_level() {
            continue;
        }
        if let Some(op) = COMPARISON_OPERATORS
            .iter()
            .copied()
            .find(|op| operator_matches_at(bytes, index, op))
        {
            return Some((index, op));
        }
    }

    None
}

/// Strip one pair of outer parentheses if they genuinely enclose the whole text
///
/// The input is trimmed first. `"(a)(b)"` is not stripped because the depth
/// returns to zero before the final character.
pub fn strip_one_outer_paren(text: &str) -> (&str, bool) {
    let trimmed = text.trim();
    let bytes = trimmed.as_bytes();
    let len = bytes.len();

    if len < 2 || bytes.first() != Some(&b'(') || bytes.last() != Some(&b')') {
        return (trimmed, false);
    }

    let mut state = ScanState::default();
    for index in 0..len {
        state.advance(bytes, index);
        if state.depth <= 0 && index + 1 < len {
            return (trimmed, false);
        }
    }

    if state.depth != 0 || state.in_quotes() {
        return (trimmed, false);
    }

    match trimmed.get(1..len - 1) {
        Some(inner) => (inner.trim(), true),
        None => (trimmed, false),
    }
}

/// Strip outer parentheses repeatedly: `"((x))"` becomes `"x"`
pub fn strip_outer_parens(text: &str) -> &str {
    let mut current = text.trim();
    loop {
        let (inner, stripped) = strip_one_outer_paren(current);
        if !stripped {
            return current;
        }
        current = inner;
    }
}

fn top_level_spans(text: &str, separator: &[u8], track_quotes: bool) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut state = ScanState::default();
    let mut start = 0;
    let mut index = 0;

    while index < bytes.len() {
        let structural = if track_quotes {
            state.advance(bytes, index)
        } else {
            bytes.get(index).is_some_and(|&b| state.advance_depth(b))
        };

        if !structural
            && state.depth == 0
            && !state.in_quotes()
            && window_matches(bytes, index, separator)
        {
            spans.push(start..index);
            index += separator.len();
            start = index;
            continue;
        }
        index += 1;
    }

    spans.push(start..bytes.len());
    spans
}

/// Byte ranges of the operands around each top-level `" AND "`
///
/// Quotes are not tracked, matching [`split_top_level_and`].
pub fn top_level_and_spans(text: &str) -> Vec<Range<usize>> {
    top_level_spans(text, AND_SEPARATOR, false)
}

/// Byte ranges of the operands around each top-level `" OR "` outside quotes
pub fn top_level_or_spans(text: &str) -> Vec<Range<usize>> {
    top_level_spans(text, OR_SEPARATOR, true)
}

fn trimmed_parts<'a>(text: &'a str, spans: Vec<Range<usize>>) -> Vec<&'a str> {
    spans
        .into_iter()
        .filter_map(|span| text.get(span))
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

/// Split on `" AND "` (any case) at paren depth 0
///
/// # Example
/// ```
/// use clause_guard::sql::scanner::split_top_level_and;
///
/// assert_eq!(split_top_level_and(" (a AND b) AND c "), vec!["(a AND b)", "c"]);
/// ```
pub fn split_top_level_and(text: &str) -> Vec<&str> {
    trimmed_parts(text, top_level_and_spans(text))
}

/// Split on `" OR "` (any case) at paren depth 0 outside quotes
pub fn split_top_level_or(text: &str) -> Vec<&str> {
    trimmed_parts(text, top_level_or_spans(text))
}

/// Whether the text has an `" OR "` at depth 0 outside quotes
pub fn contains_top_level_or(text: &str) -> bool {
    top_level_or_spans(text).len() > 1
}

/// One flag per byte: `true` where the byte sits at depth 0 outside quotes
///
/// Quote and paren characters themselves are always `false`.
pub fn top_level_mask(text: &str) -> Vec<bool> {
    let bytes = text.as_bytes();
    let mut state = ScanState::default();
    (0..bytes.len())
        .map(|index| !state.advance(bytes, index) && state.at_top_level())
        .collect()
}
