//! Configuration management for PaperScout services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Record store configuration (DynamoDB)
    pub store: StoreConfig,

    /// Search provider configuration
    pub provider: ProviderConfig,

    /// Search history configuration
    pub history: HistoryConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Shutdown timeout in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Store backend: dynamo, memory
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// AWS region for DynamoDB
    #[serde(default = "default_region")]
    pub region: String,

    /// Endpoint override (set for DynamoDB Local, unset for AWS)
    pub endpoint: Option<String>,

    /// Table holding paper records, keyed by url
    #[serde(default = "default_papers_table")]
    pub papers_table: String,

    /// Table holding search log records, keyed by search_id
    #[serde(default = "default_searches_table")]
    pub searches_table: String,

    /// Name of the timestamp-ordered global secondary index
    #[serde(default = "default_timestamp_index")]
    pub timestamp_index: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Search provider: tavily, mock
    #[serde(default = "default_search_provider")]
    pub provider: String,

    /// API key for the search provider
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,

    /// Domain the search scope is pinned to
    #[serde(default = "default_search_domain")]
    pub search_domain: String,

    /// Default number of results per search
    #[serde(default = "default_max_results")]
    pub default_max_results: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HistoryConfig {
    /// Recency semantics for listing searches: scan-page (faithful) or indexed
    #[serde(default = "default_recency_order")]
    pub recency_order: String,

    /// Default page size for the search history listing
    #[serde(default = "default_search_limit")]
    pub default_search_limit: usize,

    /// Default page size for the saved papers listing
    #[serde(default = "default_paper_limit")]
    pub default_paper_limit: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 30 }
fn default_shutdown_timeout() -> u64 { 30 }
fn default_store_backend() -> String { "dynamo".to_string() }
fn default_region() -> String { "us-east-1".to_string() }
fn default_papers_table() -> String { "papers".to_string() }
fn default_searches_table() -> String { "searches".to_string() }
fn default_timestamp_index() -> String { "timestamp-index".to_string() }
fn default_search_provider() -> String { "tavily".to_string() }
fn default_provider_timeout() -> u64 { 30 }
fn default_search_domain() -> String { crate::DEFAULT_SEARCH_DOMAIN.to_string() }
fn default_max_results() -> usize { 5 }
fn default_recency_order() -> String { "scan-page".to_string() }
fn default_search_limit() -> usize { 10 }
fn default_paper_limit() -> usize { 20 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "paperscout".to_string() }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?

            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__SERVER__PORT=8081
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                request_timeout_secs: default_request_timeout(),
                shutdown_timeout_secs: default_shutdown_timeout(),
            },
            store: StoreConfig {
                backend: default_store_backend(),
                region: default_region(),
                endpoint: None,
                papers_table: default_papers_table(),
                searches_table: default_searches_table(),
                timestamp_index: default_timestamp_index(),
            },
            provider: ProviderConfig {
                provider: default_search_provider(),
                api_key: None,
                api_base: None,
                timeout_secs: default_provider_timeout(),
                search_domain: default_search_domain(),
                default_max_results: default_max_results(),
            },
            history: HistoryConfig {
                recency_order: default_recency_order(),
                default_search_limit: default_search_limit(),
                default_paper_limit: default_paper_limit(),
            },
            observability: ObservabilityConfig {
                log_level: default_log_level(),
                json_logging: default_json_logging(),
                metrics_port: default_metrics_port(),
                service_name: default_service_name(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.store.papers_table, "papers");
        assert_eq!(config.store.searches_table, "searches");
        assert_eq!(config.provider.search_domain, "arxiv.org");
        assert_eq!(config.provider.default_max_results, 5);
    }

    #[test]
    fn test_history_defaults_match_listing_contracts() {
        let config = AppConfig::default();
        assert_eq!(config.history.recency_order, "scan-page");
        assert_eq!(config.history.default_search_limit, 10);
        assert_eq!(config.history.default_paper_limit, 20);
    }
}
