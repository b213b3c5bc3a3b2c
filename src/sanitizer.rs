//! Sanitizer - configured entry point for WHERE fragment sanitization
//!
//! Bundles the configuration, the compiled denylist and a column oracle so the
//! query-building layer can call `sanitize`/`qualify` without threading them
//! through every call.

use sqlx::PgPool;

use crate::catalog::ColumnCatalog;
use crate::config::SanitizerConfig;
use crate::error::{Result, SanitizeError};
use crate::oracle::ColumnOracle;
use crate::sql::clause::{qualify_clause, sanitize_with_denylist};
use crate::sql::security::Denylist;
use crate::types::{AllowedPrefixes, SanitizeReport};

/// Sanitizes and qualifies WHERE fragments against one column oracle
///
/// Every method is a pure function of its arguments and the (read-only)
/// oracle, so a `Sanitizer` can be shared across threads.
#[derive(Debug)]
pub struct Sanitizer<O = ColumnCatalog> {
    config: SanitizerConfig,
    denylist: Denylist,
    oracle: O,
}

impl Sanitizer<ColumnCatalog> {
    /// Connect to the configured database and load the column catalog
    ///
    /// This will:
    /// 1. Connect to `config.database_url`
    /// 2. Load every table of `config.catalog_schema` into a catalog
    pub async fn connect(config: SanitizerConfig) -> Result<Self> {
        let url = config
            .database_url
            .as_deref()
            .ok_or_else(|| SanitizeError::validation("database_url is required to connect"))?;

        let pool = PgPool::connect(url).await.map_err(|e| {
            SanitizeError::connection(format!("Database connection failed: {}", e))
        })?;

        Self::from_pool(&pool, config).await
    }

    /// Load the column catalog through an existing pool
    ///
    /// Use this when the service already owns a connection pool.
    pub async fn from_pool(pool: &PgPool, config: SanitizerConfig) -> Result<Self> {
        let catalog = ColumnCatalog::load(pool, &config.catalog_schema).await?;
        Self::new(config, catalog)
    }
}

impl<O: ColumnOracle> Sanitizer<O> {
    /// Create a sanitizer over any column oracle
    ///
    /// Fails if a configured extra keyword is not a plain word.
    pub fn new(config: SanitizerConfig, oracle: O) -> Result<Self> {
        let denylist = Denylist::with_extra(&config.extra_denied_keywords)?;
        Ok(Self {
            config,
            denylist,
            oracle,
        })
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &SanitizerConfig {
        &self.config
    }

    /// Get a reference to the column oracle
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Get a reference to the compiled denylist
    pub fn denylist(&self) -> &Denylist {
        &self.denylist
    }

    /// Sanitize a clause and report what was dropped, corrected or rejected
    pub fn sanitize_with_report(
        &self,
        clause: &str,
        table_name: &str,
        allowed: &AllowedPrefixes,
    ) -> SanitizeReport {
        let report =
            sanitize_with_denylist(clause, table_name, allowed, &self.oracle, &self.denylist);

        if let Some(keyword) = &report.rejected_keyword {
            if self.config.log_rejections {
                tracing::warn!(table = table_name, keyword = %keyword, "Rejected WHERE fragment");
            }
        }

        report
    }

    /// Sanitize a clause; `""` means the fragment must be omitted
    pub fn sanitize(&self, clause: &str, table_name: &str, allowed: &AllowedPrefixes) -> String {
        self.sanitize_with_report(clause, table_name, allowed).clause
    }

    /// Prefix bare column references with `table_name`
    pub fn qualify(&self, clause: &str, table_name: &str) -> String {
        qualify_clause(clause, table_name, &self.oracle)
    }

    /// Sanitize, then qualify the surviving conditions
    pub fn prepare(&self, clause: &str, table_name: &str, allowed: &AllowedPrefixes) -> String {
        let sanitized = self.sanitize(clause, table_name, allowed);
        self.qualify(&sanitized, table_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::UnknownColumns;

    fn catalog_sanitizer() -> Sanitizer {
        let catalog = ColumnCatalog::new()
            .with_table("users", ["id", "status", "age"])
            .with_table("orders", ["id", "user_id", "total"]);
        Sanitizer::new(SanitizerConfig::default(), catalog).unwrap()
    }

    // =========================================================================
    // Construction Tests
    // =========================================================================

    #[test]
    fn test_new_with_default_config() {
        let sanitizer = Sanitizer::new(SanitizerConfig::default(), UnknownColumns).unwrap();
        assert_eq!(sanitizer.config().catalog_schema, "public");
        assert_eq!(
            sanitizer.denylist().keywords().len(),
            crate::sql::security::DENIED_KEYWORDS.len()
        );
    }

    #[test]
    fn test_new_rejects_invalid_extra_keyword() {
        let config = SanitizerConfig::builder().deny_keyword("two words").build();
        let result = Sanitizer::new(config, UnknownColumns);
        assert!(matches!(result, Err(SanitizeError::Validation(_))));
    }

    #[tokio::test]
    async fn test_connect_requires_database_url() {
        let result = Sanitizer::connect(SanitizerConfig::default()).await;
        assert!(matches!(result, Err(SanitizeError::Validation(_))));
    }

    // =========================================================================
    // Sanitize Tests
    // =========================================================================

    #[test]
    fn test_sanitize_uses_catalog() {
        let sanitizer = catalog_sanitizer();
        let allowed = AllowedPrefixes::for_table("users");

        assert_eq!(
            sanitizer.sanitize("u.status = 'a' AND u.nickname = 'b'", "users", &allowed),
            "users.status = 'a' AND u.nickname = 'b'"
        );
    }

    #[test]
    fn test_sanitize_extra_keyword() {
        let config = SanitizerConfig::builder()
            .deny_keyword("merge")
            .log_rejections(false)
            .build();
        let sanitizer = Sanitizer::new(config, UnknownColumns).unwrap();
        let allowed = AllowedPrefixes::for_table("users");

        let report = sanitizer.sanitize_with_report("a = 1; merge into t", "users", &allowed);
        assert_eq!(report.clause, "");
        assert_eq!(report.rejected_keyword.as_deref(), Some("merge"));
    }

    #[test]
    fn test_sanitize_report_collects_changes() {
        let sanitizer = catalog_sanitizer();
        let allowed = AllowedPrefixes::for_table("orders").with("u");

        let report = sanitizer.sanitize_with_report(
            "(true AND x.total > 10 AND u.status = 'a')",
            "orders",
            &allowed,
        );

        assert_eq!(report.clause, "orders.total > 10 AND u.status = 'a'");
        assert_eq!(report.dropped, vec!["true"]);
        assert_eq!(report.rewrites.len(), 1);
        assert_eq!(report.rewrites[0].from, "x.total");
    }

    // =========================================================================
    // Qualify / Prepare Tests
    // =========================================================================

    #[test]
    fn test_qualify_uses_catalog() {
        let sanitizer = catalog_sanitizer();
        assert_eq!(
            sanitizer.qualify("status = 'a' AND nickname = 'b'", "users"),
            "users.status = 'a' AND nickname = 'b'"
        );
    }

    #[test]
    fn test_qualify_unknown_table_assumes_valid() {
        let sanitizer = catalog_sanitizer();
        assert_eq!(sanitizer.qualify("anything = 1", "audit"), "audit.anything = 1");
    }

    #[test]
    fn test_prepare() {
        let sanitizer = catalog_sanitizer();
        let allowed = AllowedPrefixes::for_table("users");

        assert_eq!(
            sanitizer.prepare("(status = 'active' OR status = 'pending')", "users", &allowed),
            "(users.status = 'active' OR users.status = 'pending')"
        );
        assert_eq!(sanitizer.prepare("1=1", "users", &allowed), "");
    }

    #[test]
    fn test_sanitizer_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Sanitizer>();
        assert_send_sync::<Sanitizer<UnknownColumns>>();
    }
}
