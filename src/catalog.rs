//! ColumnCatalog - table to column-set snapshot used as the column oracle
//!
//! A catalog is built once at startup, either from PostgreSQL's
//! `information_schema` or from a JSON document, and is read-only afterwards.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};

use crate::error::Result;
use crate::oracle::{ColumnOracle, ColumnSet};

/// Immutable snapshot of the valid columns of each known table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnCatalog {
    /// Keyed by lower-cased table name
    tables: HashMap<String, ColumnSet>,
    /// When the snapshot was taken from the database
    #[serde(rename = "loadedAt", skip_serializing_if = "Option::is_none")]
    loaded_at: Option<DateTime<Utc>>,
}

impl ColumnCatalog {
    /// Create an empty catalog (every table unknown)
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a table's columns
    pub fn with_table<I, S>(mut self, table: &str, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.insert_table(table, ColumnSet::new(columns));
        self
    }

    /// Add or replace a table's columns in place
    pub fn insert_table(&mut self, table: &str, columns: ColumnSet) {
        self.tables.insert(table.trim().to_lowercase(), columns);
    }

    /// Parse a catalog from `{"table": ["col", ...], ...}`
    ///
    /// # Example
    /// ```
    /// use clause_guard::{ColumnCatalog, ColumnOracle};
    ///
    /// let catalog = ColumnCatalog::from_json(r#"{"users": ["id", "Status"]}"#).unwrap();
    /// assert!(catalog.columns("users").unwrap().contains("status"));
    /// assert!(catalog.columns("orders").is_none());
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let tables: BTreeMap<String, Vec<String>> = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for (table, columns) in tables {
            catalog.insert_table(&table, ColumnSet::new(columns));
        }
        Ok(catalog)
    }

    /// Serialize the table map back to `{"table": ["col", ...]}`
    pub fn to_json(&self) -> Result<String> {
        let tables: BTreeMap<&str, Vec<&str>> = self
            .tables
            .iter()
            .map(|(table, columns)| (table.as_str(), columns.sorted()))
            .collect();
        Ok(serde_json::to_string(&tables)?)
    }

    /// Load every table of `schema` from `information_schema.columns`
    pub async fn load(pool: &PgPool, schema: &str) -> Result<Self> {
        let rows = sqlx::query(
            r#"
            SELECT table_name::text AS table_name, column_name::text AS column_name
            FROM information_schema.columns
            WHERE table_schema = $1
            ORDER BY table_name, ordinal_position
            "#,
        )
        .bind(schema)
        .fetch_all(pool)
        .await?;

        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for row in rows {
            let table: String = row.try_get("table_name")?;
            let column: String = row.try_get("column_name")?;
            grouped.entry(table).or_default().push(column);
        }

        let mut catalog = Self::new();
        for (table, columns) in grouped {
            catalog.insert_table(&table, ColumnSet::new(columns));
        }
        catalog.loaded_at = Some(Utc::now());

        tracing::info!(
            schema,
            tables = catalog.len(),
            "Loaded column catalog"
        );

        Ok(catalog)
    }

    /// Known table names, sorted
    pub fn tables(&self) -> Vec<&str> {
        let mut tables: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        tables.sort_unstable();
        tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// When the catalog was loaded from the database, if it was
    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }
}

impl ColumnOracle for ColumnCatalog {
    fn columns(&self, table: &str) -> Option<ColumnSet> {
        self.tables.get(&table.trim().to_lowercase()).cloned()
    }
}
