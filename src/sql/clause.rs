//! Clause-level sanitize and qualify operations
//!
//! Both operations treat a clause as text. The clause is split into top-level
//! AND conditions; each condition is walked through its parenthesised groups
//! and OR disjuncts down to leaves, and only a leaf's leading column
//! reference is ever rewritten. Untouched parts of the text are kept
//! byte-for-byte, including the original separators.

use std::borrow::Cow;
use std::ops::Range;
use regex::Regex;

use crate::oracle::{ColumnOracle, ColumnSet};
use crate::sql::literal::{is_sql_literal_expression, is_trivial_condition};
use crate::sql::reference::{IDENTIFIER, extract_left_operand, extract_table_and_column};
use crate::sql::scanner::{
    contains_top_level_or, find_comparison_operator, is_identifier_byte, strip_one_outer_paren, strip_outer_parens,
    top_level_and_spans, top_level_mask, top_level_or_spans,
};
use crate::sql::security::Denylist;
use crate::types::{AllowedPrefixes, PrefixRewrite, SanitizeReport};

/// Niladic SQL values that look like bare identifiers
const VALUE_KEYWORDS: &[&str] = &[
    "current_date",
    "current_time",
    "current_timestamp",
    "current_user",
    "localtime",
    "localtimestamp",
    "session_user",
];

// ============================================================================
// Expression walking
// ============================================================================

/// Rewrite `expr` by applying `leaf` to every leaf condition
///
/// Groups are unwrapped one pair of parens at a time, then OR is split before
/// AND (AND binds tighter). Returns `Cow::Borrowed` when nothing changed.
fn rewrite_expression<'t>(
    expr: &'t str,
    leaf: &mut dyn FnMut(&'t str) -> Cow<'t, str>,
) -> Cow<'t, str> {
    let (inner, wrapped) = strip_one_outer_paren(expr);
    if wrapped {
        return match rewrite_expression(inner, leaf) {
            Cow::Borrowed(_) => Cow::Borrowed(expr),
            Cow::Owned(rewritten) => Cow::Owned(format!("({rewritten})")),
        };
    }

    let or_spans = top_level_or_spans(expr);
    if or_spans.len() > 1 {
        return rewrite_spans(expr, &or_spans, leaf);
    }

    let and_spans = top_level_and_spans(expr);
    if and_spans.len() > 1 {
        return rewrite_spans(expr, &and_spans, leaf);
    }

    leaf(expr.trim())
}

/// Rewrite each span of `expr`, keeping the text between spans as-is
fn rewrite_spans<'t>(
    expr: &'t str,
    spans: &[Range<usize>],
    leaf: &mut dyn FnMut(&'t str) -> Cow<'t, str>,
) -> Cow<'t, str> {
    let mut out = String::with_capacity(expr.len() + 16);
    let mut cursor = 0;
    let mut changed = false;

    for span in spans {
        let Some(segment) = expr.get(span.clone()) else {
            continue;
        };
        let trimmed = segment.trim();
        if trimmed.is_empty() {
            continue;
        }
        let start = span.start + (segment.len() - segment.trim_start().len());
        let end = start + trimmed.len();

        out.push_str(expr.get(cursor..start).unwrap_or_default());
        let rewritten = rewrite_expression(trimmed, leaf);
        changed |= matches!(rewritten, Cow::Owned(_));
        out.push_str(&rewritten);
        cursor = end;
    }

    if !changed {
        return Cow::Borrowed(expr);
    }
    out.push_str(expr.get(cursor..).unwrap_or_default());
    Cow::Owned(out)
}

// ============================================================================
// Sanitize
// ============================================================================

/// Prefix correction policy for one sanitize call
struct PrefixFixer<'a> {
    table_name: &'a str,
    allowed: &'a AllowedPrefixes,
    columns: Option<&'a ColumnSet>,
}

impl PrefixFixer<'_> {
    fn is_allowed(&self, prefix: &str) -> bool {
        prefix.eq_ignore_ascii_case(self.table_name) || self.allowed.contains(prefix)
    }

    fn rewrite_leaf<'t>(&self, leaf: &'t str, rewrites: &mut Vec<PrefixRewrite>) -> Cow<'t, str> {
        let Some(reference) = extract_table_and_column(leaf) else {
            return Cow::Borrowed(leaf);
        };

        if self.is_allowed(&reference.prefix) {
            return Cow::Borrowed(leaf);
        }

        if let Some(columns) = self.columns {
            if !columns.contains(&reference.column) {
                tracing::trace!(
                    table = self.table_name,
                    column = %reference.column,
                    "Leaving reference to unknown column untouched"
                );
                return Cow::Borrowed(leaf);
            }
        }

        let from = reference.qualified();
        let to = format!("{}.{}", self.table_name, reference.column);
        if !leaf.contains(&from) {
            // Quoted identifiers: the unquoted form is not in the text
            return Cow::Borrowed(leaf);
        }

        tracing::debug!(from = %from, to = %to, "Correcting column prefix");
        let rewritten = leaf.replacen(&from, &to, 1);
        rewrites.push(PrefixRewrite { from, to });
        Cow::Owned(rewritten)
    }

    fn rewrite<'t>(&self, cond: &'t str, rewrites: &mut Vec<PrefixRewrite>) -> Cow<'t, str> {
        rewrite_expression(cond, &mut |leaf| self.rewrite_leaf(leaf, rewrites))
    }
}

/// Steps after the security check: paren policy, split, drop, correct, join
fn sanitize_body(clause: &str, fixer: &PrefixFixer<'_>, report: &mut SanitizeReport) -> String {
    let (inner, wrapped) = strip_one_outer_paren(clause);
    let preserve_parens = wrapped && contains_top_level_or(strip_outer_parens(inner));

    let body = strip_outer_parens(clause);
    let spans = top_level_and_spans(body);

    let mut survivors: Vec<(usize, String)> = Vec::new();
    for (index, span) in spans.iter().enumerate() {
        let cond = body.get(span.clone()).unwrap_or_default().trim();
        if cond.is_empty() {
            continue;
        }

        if is_trivial_condition(strip_outer_parens(cond)) {
            tracing::debug!(condition = cond, "Dropping trivial condition");
            report.dropped.push(cond.to_string());
            continue;
        }

        let rewritten = fixer.rewrite(cond, &mut report.rewrites);
        survivors.push((index, rewritten.into_owned()));
    }

    // A lone parenthesised survivor is a clause of its own
    if let [(_, only)] = survivors.as_slice() {
        if strip_one_outer_paren(only).1 {
            let only = only.clone();
            return sanitize_body(&only, fixer, report);
        }
    }

    let mut joined = String::new();
    let mut previous: Option<usize> = None;
    for (index, cond) in &survivors {
        if let Some(prev) = previous {
            let separator = match (spans.get(prev), spans.get(*index)) {
                (Some(left), Some(right)) if prev + 1 == *index => {
                    body.get(left.end..right.start).unwrap_or(" AND ")
                }
                _ => " AND ",
            };
            joined.push_str(separator);
        }
        joined.push_str(cond);
        previous = Some(*index);
    }

    if preserve_parens && !joined.is_empty() {
        format!("({joined})")
    } else {
        joined
    }
}

/// Sanitize a clause against `denylist` and return what was done
///
/// A rejected clause yields an empty `clause` and `rejected_keyword` set.
pub fn sanitize_with_denylist(
    clause: &str,
    table_name: &str,
    allowed: &AllowedPrefixes,
    oracle: &dyn ColumnOracle,
    denylist: &Denylist,
) -> SanitizeReport {
    let trimmed = clause.trim();
    if trimmed.is_empty() {
        return SanitizeReport::default();
    }

    if let Err(err) = denylist.check(trimmed) {
        return SanitizeReport::rejected(err.rejected_keyword().unwrap_or_default());
    }

    let columns = oracle.columns(table_name);
    let fixer = PrefixFixer {
        table_name,
        allowed,
        columns: columns.as_ref(),
    };

    let mut report = SanitizeReport::default();
    let sanitized = sanitize_body(trimmed, &fixer, &mut report);
    report.clause = sanitized;
    report
}

/// Sanitize a clause with the built-in denylist
///
/// Returns `""` for a rejected clause or one made only of trivial
/// conditions; callers must omit the fragment in that case.
///
/// # Example
/// ```
/// use clause_guard::{AllowedPrefixes, ColumnSet, sanitize_clause};
///
/// let allowed = AllowedPrefixes::for_table("users");
/// let oracle = |_: &str| Some(ColumnSet::new(["status", "age"]));
///
/// assert_eq!(
///     sanitize_clause("wrong.status = 'a' AND 1=1", "users", &allowed, &oracle),
///     "users.status = 'a'"
/// );
/// assert_eq!(sanitize_clause("a=1; DROP TABLE x", "users", &allowed, &oracle), "");
/// ```
pub fn sanitize_clause(
    clause: &str,
    table_name: &str,
    allowed: &AllowedPrefixes,
    oracle: &dyn ColumnOracle,
) -> String {
    let report = sanitize_with_denylist(clause, table_name, allowed, oracle, Denylist::builtin());
    if let Some(keyword) = &report.rejected_keyword {
        tracing::warn!(table = table_name, keyword = %keyword, "Rejected WHERE fragment");
    }
    report.clause
}

// ============================================================================
// Qualify
// ============================================================================

/// Bare-column qualification policy for one qualify call
struct Qualifier<'a> {
    table_name: &'a str,
    columns: Option<&'a ColumnSet>,
}

impl Qualifier<'_> {
    fn qualify_leaf<'t>(&self, leaf: &'t str) -> Cow<'t, str> {
        if is_sql_literal_expression(leaf) || is_trivial_condition(leaf) {
            return Cow::Borrowed(leaf);
        }

        let Some(left) = extract_left_operand(leaf) else {
            return Cow::Borrowed(leaf);
        };

        // Already qualified, or an expression we will not guess into
        if left.contains('.') || left.contains('(') {
            return Cow::Borrowed(leaf);
        }

        if !IDENTIFIER.is_match(&left)
            || is_sql_literal_expression(&left)
            || VALUE_KEYWORDS.contains(&left.to_lowercase().as_str())
        {
            return Cow::Borrowed(leaf);
        }

        if let Some(columns) = self.columns {
            if !columns.contains(&left) {
                return Cow::Borrowed(leaf);
            }
        }

        // The rewrite must land inside the left operand, never on the value side
        let left_end = match find_comparison_operator(leaf) {
            Some((index, _)) => index,
            None => leaf.find(char::is_whitespace).unwrap_or(leaf.len()),
        };

        match qualify_identifier(leaf, &left, self.table_name, left_end) {
            Some(rewritten) => {
                tracing::debug!(table = self.table_name, column = %left, "Qualifying column");
                Cow::Owned(rewritten)
            }
            None => Cow::Borrowed(leaf),
        }
    }
}

/// Prefix the first free occurrence of `identifier` ending by `limit` with `table_name.`
///
/// An occurrence is free when it is a whole word at depth 0 outside quotes,
/// not preceded by `.` and not followed by `.` or `(`.
fn qualify_identifier(
    text: &str,
    identifier: &str,
    table_name: &str,
    limit: usize,
) -> Option<String> {
    let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(identifier))).ok()?;
    let mask = top_level_mask(text);
    let bytes = text.as_bytes();

    let found = pattern.find_iter(text).find(|m| {
        let start = m.start();
        let preceded = start > 0
            && bytes
                .get(start - 1)
                .is_some_and(|&b| b == b'.' || is_identifier_byte(b));
        let followed = matches!(bytes.get(m.end()), Some(b'.') | Some(b'('))
            || bytes.get(m.end()).is_some_and(|&b| is_identifier_byte(b));

        m.end() <= limit && mask.get(start).copied().unwrap_or(false) && !preceded && !followed
    })?;

    Some(format!(
        "{}{}.{}{}",
        text.get(..found.start())?,
        table_name,
        found.as_str(),
        text.get(found.end()..)?
    ))
}

/// Prefix bare column references with `table_name`
///
/// Literals, trivial conditions, already-qualified references and function
/// expressions are left alone, as are columns the oracle does not know.
///
/// # Example
/// ```
/// use clause_guard::{ColumnSet, UnknownColumns, qualify_clause};
///
/// let oracle = |_: &str| Some(ColumnSet::new(["status"]));
/// assert_eq!(
///     qualify_clause("status = 'active'", "mastertask", &oracle),
///     "mastertask.status = 'active'"
/// );
/// assert_eq!(qualify_clause("true", "mastertask", &UnknownColumns), "true");
/// ```
pub fn qualify_clause(clause: &str, table_name: &str, oracle: &dyn ColumnOracle) -> String {
    let trimmed = clause.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let columns = oracle.columns(table_name);
    let qualifier = Qualifier {
        table_name,
        columns: columns.as_ref(),
    };

    rewrite_expression(trimmed, &mut |leaf| qualifier.qualify_leaf(leaf)).into_owned()
}

/// Sanitize, then qualify what survived
pub fn sanitize_and_qualify(
    clause: &str,
    table_name: &str,
    allowed: &AllowedPrefixes,
    oracle: &dyn ColumnOracle,
) -> String {
    let sanitized = sanitize_clause(clause, table_name, allowed, oracle);
    qualify_clause(&sanitized, table_name, oracle)
}
