//! Configuration management for FlightGraph services
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
    #[serde(default = "default_server")]
    pub server: ServerConfig,

    /// Graph store configuration
    #[serde(default = "default_graph")]
    pub graph: GraphConfig,

    /// Language model configuration (intent classification, inference)
    #[serde(default = "default_llm")]
    pub llm: LlmConfig,

    /// Observability configuration
    #[serde(default = "default_observability")]
    pub observability: ObservabilityConfig,

    /// Rate limiting configuration
    #[serde(default = "default_rate_limit_config")]
    pub rate_limit: RateLimitConfig,
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
pub struct GraphConfig {
    /// Store provider: neo4j, mock
    #[serde(default = "default_graph_provider")]
    pub provider: String,

    /// HTTP endpoint of the Neo4j server
    #[serde(default = "default_graph_uri")]
    pub uri: String,

    /// Database name
    #[serde(default = "default_graph_database")]
    pub database: String,

    #[serde(default = "default_graph_username")]
    pub username: String,

    #[serde(default)]
    pub password: Option<String>,

    /// Query timeout in seconds
    #[serde(default = "default_graph_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Model provider: openai (any OpenAI-compatible endpoint), mock
    #[serde(default = "default_llm_provider")]
    pub provider: String,

    /// Chat completions endpoint
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    /// API key
    pub api_key: Option<String>,

    /// Model to use
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Sampling temperature; classification wants determinism
    #[serde(default)]
    pub temperature: f32,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
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

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests per second (global)
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,

    /// Burst capacity
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 30 }
fn default_shutdown_timeout() -> u64 { 30 }
fn default_graph_provider() -> String { "neo4j".to_string() }
fn default_graph_uri() -> String { "http://localhost:7474".to_string() }
fn default_graph_database() -> String { "neo4j".to_string() }
fn default_graph_username() -> String { "neo4j".to_string() }
fn default_graph_timeout() -> u64 { 30 }
fn default_llm_provider() -> String { "openai".to_string() }
fn default_llm_endpoint() -> String { "https://api.groq.com/openai/v1/chat/completions".to_string() }
fn default_llm_model() -> String { "llama-3.1-8b-instant".to_string() }
fn default_llm_timeout() -> u64 { 30 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "flightgraph".to_string() }
fn default_rate_limit() -> u32 { 50 }
fn default_burst() -> u32 { 100 }
fn default_enabled() -> bool { true }

fn default_server() -> ServerConfig {
    ServerConfig {
        host: default_host(),
        port: default_port(),
        request_timeout_secs: default_request_timeout(),
        shutdown_timeout_secs: default_shutdown_timeout(),
    }
}

fn default_graph() -> GraphConfig {
    GraphConfig {
        provider: default_graph_provider(),
        uri: default_graph_uri(),
        database: default_graph_database(),
        username: default_graph_username(),
        password: None,
        timeout_secs: default_graph_timeout(),
    }
}

fn default_llm() -> LlmConfig {
    LlmConfig {
        provider: default_llm_provider(),
        endpoint: default_llm_endpoint(),
        api_key: None,
        model: default_llm_model(),
        temperature: 0.0,
        timeout_secs: default_llm_timeout(),
    }
}

fn default_observability() -> ObservabilityConfig {
    ObservabilityConfig {
        log_level: default_log_level(),
        json_logging: default_json_logging(),
        metrics_port: default_metrics_port(),
        service_name: default_service_name(),
    }
}

fn default_rate_limit_config() -> RateLimitConfig {
    RateLimitConfig {
        requests_per_second: default_rate_limit(),
        burst: default_burst(),
        enabled: default_enabled(),
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__GRAPH__URI=http://neo4j:7474
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
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
                    .try_parsing(true)
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
            server: default_server(),
            graph: default_graph(),
            llm: default_llm(),
            observability: default_observability(),
            rate_limit: default_rate_limit_config(),
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
        assert_eq!(config.graph.database, "neo4j");
        assert_eq!(config.llm.model, "llama-3.1-8b-instant");
        assert_eq!(config.llm.temperature, 0.0);
    }

    #[test]
    fn test_partial_sections_fall_back_to_defaults() {
        let config: AppConfig = Config::builder()
            .set_override("graph.provider", "mock")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.graph.provider, "mock");
        assert_eq!(config.graph.uri, "http://localhost:7474");
        assert_eq!(config.rate_limit.burst, 100);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }
}
