//! Property-based tests for clause sanitization using proptest.
//!
//! Clauses are generated from column references, comparison operators and
//! values, mixed with always-true spellings and injected statements.

use clause_guard::sql::security::DENIED_KEYWORDS;
use clause_guard::{
    AllowedPrefixes, ColumnSet, UnknownColumns, qualify_clause, sanitize_and_qualify,
    sanitize_clause,
};
use proptest::prelude::*;

const TABLE: &str = "users";

/// Identifiers always carry an underscore so they never collide with SQL keywords
fn identifier() -> impl Strategy<Value = String> {
    "[a-z]{1,6}_[a-z0-9]{1,4}"
}

fn operator() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["=", "<>", ">", "<", ">=", "!="])
}

fn value() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u32..10_000).prop_map(|n| n.to_string()),
        "[a-z0-9]{0,8}".prop_map(|s| format!("'{s}'")),
    ]
}

fn trivial() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "1=1", "1 = 1", "0=0", "true", "TRUE", "true = true", "'1'='1'", "NOT false", "(1=1)",
    ])
}

/// `prefix.column OP value`, with the prefix drawn from the table, an allowed
/// alias or a random stale alias
fn condition() -> impl Strategy<Value = String> {
    (
        prop_oneof![
            Just(TABLE.to_string()),
            Just("profile".to_string()),
            identifier(),
        ],
        identifier(),
        operator(),
        value(),
    )
        .prop_map(|(prefix, column, op, value)| format!("{prefix}.{column} {op} {value}"))
}

/// A conjunct: a plain condition, an OR group or a trivial condition
fn conjunct() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => condition(),
        1 => (condition(), condition()).prop_map(|(a, b)| format!("({a} OR {b})")),
        1 => trivial().prop_map(str::to_string),
    ]
}

fn clause() -> impl Strategy<Value = String> {
    (prop::collection::vec(conjunct(), 1..5), any::<bool>()).prop_map(|(parts, wrap)| {
        let joined = parts.join(" AND ");
        if wrap { format!("({joined})") } else { joined }
    })
}

fn allowed() -> AllowedPrefixes {
    AllowedPrefixes::for_table(TABLE).with("profile")
}

// =============================================================================
// Sanitize Property Tests
// =============================================================================

proptest! {
    /// Sanitizing a sanitized clause changes nothing
    #[test]
    fn sanitize_is_idempotent(clause in clause(), known in prop::collection::vec(identifier(), 0..4)) {
        let oracle = move |_: &str| Some(ColumnSet::new(&known));

        let once = sanitize_clause(&clause, TABLE, &allowed(), &oracle);
        let twice = sanitize_clause(&once, TABLE, &allowed(), &oracle);
        prop_assert_eq!(&once, &twice, "input: {}", clause);

        let unknown_once = sanitize_clause(&clause, TABLE, &allowed(), &UnknownColumns);
        let unknown_twice = sanitize_clause(&unknown_once, TABLE, &allowed(), &UnknownColumns);
        prop_assert_eq!(unknown_once, unknown_twice);
    }

    /// A clause made only of always-true conditions collapses to nothing
    #[test]
    fn trivial_clause_collapses(parts in prop::collection::vec(trivial(), 1..6), wrap in any::<bool>()) {
        let joined = parts.join(" AND ");
        let clause = if wrap { format!("({joined})") } else { joined };

        prop_assert_eq!(sanitize_clause(&clause, TABLE, &AllowedPrefixes::new(), &UnknownColumns), "");
    }

    /// Any clause carrying a DML/DDL verb is dropped whole
    #[test]
    fn denied_keyword_rejects_clause(
        clause in clause(),
        keyword in prop::sample::select(DENIED_KEYWORDS.to_vec()),
        upper in any::<bool>(),
        separator in prop::sample::select(vec![" ", "; ", ";", "\n", "\t"]),
        tail in "[a-z ]{0,12}",
    ) {
        let keyword = if upper { keyword.to_uppercase() } else { keyword.to_string() };
        let injected = format!("{clause}{separator}{keyword} {tail}");

        prop_assert_eq!(sanitize_clause(&injected, TABLE, &allowed(), &UnknownColumns), "");
    }

    /// Conditions already qualified with the main table come out byte-identical
    #[test]
    fn same_table_conditions_untouched(
        conditions in prop::collection::vec((identifier(), operator(), value()), 1..5),
    ) {
        let clause = conditions
            .iter()
            .map(|(column, op, value)| format!("{TABLE}.{column} {op} {value}"))
            .collect::<Vec<_>>()
            .join(" AND ");

        prop_assert_eq!(sanitize_clause(&clause, TABLE, &allowed(), &UnknownColumns), clause);
    }

    /// A stale prefix on a known column is replaced by the main table, once
    #[test]
    fn wrong_prefix_replaced_once(
        wrong in identifier(),
        column in identifier(),
        op in operator(),
        value in value(),
    ) {
        let oracle = {
            let column = column.clone();
            move |_: &str| Some(ColumnSet::new([column.as_str()]))
        };
        let clause = format!("{wrong}.{column} {op} {value}");

        let sanitized = sanitize_clause(&clause, TABLE, &allowed(), &oracle);
        prop_assert_eq!(sanitized, format!("{TABLE}.{column} {op} {value}"));
    }

    /// A stale prefix on an unknown column is left for the database to judge
    #[test]
    fn wrong_prefix_unknown_column_kept(
        wrong in identifier(),
        column in identifier(),
        op in operator(),
        value in value(),
    ) {
        let oracle = |_: &str| Some(ColumnSet::new(["id"]));
        let clause = format!("{wrong}.{column} {op} {value}");

        prop_assert_eq!(sanitize_clause(&clause, TABLE, &allowed(), &oracle), clause);
    }
}

// =============================================================================
// Qualify Property Tests
// =============================================================================

proptest! {
    /// Bare columns are qualified and qualifying again changes nothing
    #[test]
    fn qualify_is_idempotent(
        conditions in prop::collection::vec((identifier(), operator(), value()), 1..5),
    ) {
        let clause = conditions
            .iter()
            .map(|(column, op, value)| format!("{column} {op} {value}"))
            .collect::<Vec<_>>()
            .join(" AND ");

        let once = qualify_clause(&clause, TABLE, &UnknownColumns);
        let twice = qualify_clause(&once, TABLE, &UnknownColumns);
        prop_assert_eq!(&once, &twice);

        let expected = conditions
            .iter()
            .map(|(column, op, value)| format!("{TABLE}.{column} {op} {value}"))
            .collect::<Vec<_>>()
            .join(" AND ");
        prop_assert_eq!(once, expected);
    }

    /// Sanitize-then-qualify is stable too
    #[test]
    fn sanitize_and_qualify_is_idempotent(clause in clause()) {
        let once = sanitize_and_qualify(&clause, TABLE, &allowed(), &UnknownColumns);
        let twice = sanitize_and_qualify(&once, TABLE, &allowed(), &UnknownColumns);
        prop_assert_eq!(once, twice, "input: {}", clause);
    }
}
