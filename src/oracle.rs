//! Column oracle: which columns are valid for a table
//!
//! The engine only ever reads from an oracle. `None` means the table's
//! columns are unknown, and every column is then assumed valid.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Lower-cased set of column names for one table
///
/// Cloning is cheap; the set is shared behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSet(Arc<HashSet<String>>);

impl ColumnSet {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(Arc::new(
            columns
                .into_iter()
                .map(|c| c.as_ref().trim().to_lowercase())
                .filter(|c| !c.is_empty())
                .collect(),
        ))
    }

    /// Case-insensitive membership test
    pub fn contains(&self, column: &str) -> bool {
        self.0.contains(&column.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Column names in sorted order
    pub fn sorted(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = self.0.iter().map(String::as_str).collect();
        columns.sort_unstable();
        columns
    }
}

impl<S: AsRef<str>> FromIterator<S> for ColumnSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl Serialize for ColumnSet {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        self.sorted().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ColumnSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let columns = Vec::<String>::deserialize(deserializer)?;
        Ok(Self::new(columns))
    }
}

/// Read-only lookup of the valid columns of a table
///
/// Implementations must tolerate concurrent reads.
pub trait ColumnOracle: Send + Sync {
    /// Columns of `table`, or `None` if they cannot be validated
    fn columns(&self, table: &str) -> Option<ColumnSet>;
}

/// Oracle that never knows any table: every column is assumed valid
#[derive(Debug, Clone, Copy, Default)]
pub struct UnknownColumns;

impl ColumnOracle for UnknownColumns {
    fn columns(&self, _table: &str) -> Option<ColumnSet> {
        None
    }
}

impl<F> ColumnOracle for F
where
    F: Fn(&str) -> Option<ColumnSet> + Send + Sync,
{
    fn columns(&self, table: &str) -> Option<ColumnSet> {
        self(table)
    }
}

impl<O: ColumnOracle + ?Sized> ColumnOracle for Arc<O> {
    fn columns(&self, table: &str) -> Option<ColumnSet> {
        (**self).columns(table)
    }
}

/// Whether `column` passes the oracle for `table`: known and present, or unknown
pub fn column_is_valid(oracle: &dyn ColumnOracle, table: &str, column: &str) -> bool {
    oracle
        .columns(table)
        .is_none_or(|columns| columns.contains(column))
}
