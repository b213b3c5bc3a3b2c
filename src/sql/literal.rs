//! Recognition of bare SQL literals and always-true conditions

/// Bare literals that look like identifiers but must never be prefixed
const SQL_LITERALS: &[&str] = &["true", "false", "null", "1=1", "0=0"];

/// Tautologies that can be dropped from a conjunction without changing it
const TRIVIAL_CONDITIONS: &[&str] = &["1=1", "0=0", "true", "true=true", "'1'='1'", "not false"];

/// Lower-case, collapse whitespace runs and drop whitespace around `=`
///
/// `"TRUE  =  true"` and `"true=true"` both normalize to `"true=true"`.
fn normalize(cond: &str) -> String {
    let collapsed = cond
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    collapsed.replace(" =", "=").replace("= ", "=")
}

/// Whether the condition is one of the bare literals `true`, `false`, `null`, `1=1`, `0=0`
pub fn is_sql_literal_expression(cond: &str) -> bool {
    let normalized = normalize(cond);
    SQL_LITERALS.contains(&normalized.as_str())
}

/// Whether the condition is an always-true spelling such as `1=1` or `true = true`
pub fn is_trivial_condition(cond: &str) -> bool {
    let normalized = normalize(cond);
    TRIVIAL_CONDITIONS.contains(&normalized.as_str())
}
