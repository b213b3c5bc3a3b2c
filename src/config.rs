//! Configuration for the Sanitizer
//!
//! Provides a builder pattern for configuring the sanitizer.

use serde::{Deserialize, Serialize};

fn default_catalog_schema() -> String {
    "public".to_string()
}

fn default_log_rejections() -> bool {
    true
}

/// Configuration for the sanitizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizerConfig {
    /// PostgreSQL database URL, used only to load the column catalog
    #[serde(rename = "databaseUrl", default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    /// Schema whose tables feed the column catalog (default: "public")
    #[serde(rename = "catalogSchema", default = "default_catalog_schema")]
    pub catalog_schema: String,
    /// Keywords rejected in addition to the built-in DML/DDL verbs
    #[serde(rename = "extraDeniedKeywords", default)]
    pub extra_denied_keywords: Vec<String>,
    /// Whether rejected clauses are logged at WARN level
    #[serde(rename = "logRejections", default = "default_log_rejections")]
    pub log_rejections: bool,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            catalog_schema: default_catalog_schema(),
            extra_denied_keywords: Vec::new(),
            log_rejections: default_log_rejections(),
        }
    }
}

impl SanitizerConfig {
    /// Create a new configuration builder
    pub fn builder() -> SanitizerConfigBuilder {
        SanitizerConfigBuilder::new()
    }
}

/// Builder for SanitizerConfig
#[derive(Debug, Default)]
pub struct SanitizerConfigBuilder {
    config: SanitizerConfig,
}

impl SanitizerConfigBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the database URL the column catalog is loaded from
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = Some(url.into());
        self
    }

    /// Set the catalog schema (default: "public")
    pub fn catalog_schema(mut self, schema: impl Into<String>) -> Self {
        self.config.catalog_schema = schema.into();
        self
    }

    /// Reject an additional keyword
    pub fn deny_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.config.extra_denied_keywords.push(keyword.into());
        self
    }

    /// Enable or disable WARN logs for rejected clauses (default: true)
    pub fn log_rejections(mut self, enabled: bool) -> Self {
        self.config.log_rejections = enabled;
        self
    }

    /// Build the configuration
    pub fn build(self) -> SanitizerConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Default Tests
    // =========================================================================

    #[test]
    fn test_default_config() {
        let config = SanitizerConfig::builder().build();

        assert!(config.database_url.is_none());
        assert_eq!(config.catalog_schema, "public");
        assert!(config.extra_denied_keywords.is_empty());
        assert!(config.log_rejections);
        assert_eq!(config, SanitizerConfig::default());
    }

    // =========================================================================
    // Builder Tests
    // =========================================================================

    #[test]
    fn test_full_custom_config() {
        let config = SanitizerConfig::builder()
            .database_url("postgres://localhost/test")
            .catalog_schema("app")
            .deny_keyword("merge")
            .deny_keyword("call")
            .log_rejections(false)
            .build();

        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/test")
        );
        assert_eq!(config.catalog_schema, "app");
        assert_eq!(config.extra_denied_keywords, vec!["merge", "call"]);
        assert!(!config.log_rejections);
    }

    #[test]
    fn test_builder_accepts_string() {
        let config = SanitizerConfig::builder()
            .catalog_schema(String::from("tenant_1"))
            .build();
        assert_eq!(config.catalog_schema, "tenant_1");
    }

    #[test]
    fn test_builder_debug() {
        let builder = SanitizerConfig::builder();
        let debug_str = format!("{:?}", builder);
        assert!(debug_str.contains("SanitizerConfigBuilder"));
    }

    // =========================================================================
    // Serde Tests
    // =========================================================================

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: SanitizerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SanitizerConfig::default());
    }

    #[test]
    fn test_deserialize_camel_case() {
        let config: SanitizerConfig = serde_json::from_str(
            r#"{"databaseUrl": "postgres://db", "catalogSchema": "app", "extraDeniedKeywords": ["merge"], "logRejections": false}"#,
        )
        .unwrap();

        assert_eq!(config.database_url.as_deref(), Some("postgres://db"));
        assert_eq!(config.catalog_schema, "app");
        assert_eq!(config.extra_denied_keywords, vec!["merge"]);
        assert!(!config.log_rejections);
    }

    #[test]
    fn test_serialize_skips_missing_url() {
        let json = serde_json::to_value(SanitizerConfig::default()).unwrap();
        assert!(json.get("databaseUrl").is_none());
        assert_eq!(json["catalogSchema"], "public");
    }
}
