//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables, a `.env` file, or defaults.

use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Endpoint name used to look up the symbol search route.
pub const SEARCH_SYMBOL_ENDPOINT: &str = "search-symbol";

/// Main configuration structure for the MCP server.
///
/// This struct contains all configurable aspects of the server, organized
/// by domain for clarity and maintainability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// FinnHub provider configuration.
    pub finnhub: FinnhubConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Whether to include timestamps in log output.
    pub with_timestamps: bool,
}

/// A named, activatable provider endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Lookup key (e.g. `search-symbol`).
    pub name: String,

    /// Path relative to the provider base URL.
    pub url: String,

    /// Inactive endpoints are ignored during lookup.
    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default)]
    pub description: Option<String>,
}

/// Retry settings for outbound provider calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the initial attempt.
    pub max_retries: u32,

    /// Backoff unit; attempt `n` waits `base_delay * 2^n`.
    pub base_delay_ms: u64,
}

/// Circuit breaker settings, shared by every request through one client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerSettings {
    /// Consecutive failed calls before the circuit opens.
    pub failure_threshold: u32,

    /// How long the circuit stays open.
    pub cooldown_secs: u64,
}

/// FinnHub provider configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct FinnhubConfig {
    /// Provider base URL, without trailing endpoint path.
    pub base_url: String,

    /// API key sent as the `X-Finnhub-Token` header.
    /// Get a free key at: https://finnhub.io/register
    #[serde(skip_serializing, default)]
    pub api_key: Option<String>,

    /// Configured endpoints, looked up by name.
    pub endpoints: Vec<EndpointConfig>,

    /// Per-attempt request timeout.
    pub timeout_seconds: u64,

    pub retry: RetryConfig,

    pub circuit_breaker: CircuitBreakerSettings,
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for FinnhubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinnhubConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("endpoints", &self.endpoints)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("retry", &self.retry)
            .field("circuit_breaker", &self.circuit_breaker)
            .finish()
    }
}

fn default_true() -> bool {
    true
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
        }
    }
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown_secs: 30,
        }
    }
}

impl Default for FinnhubConfig {
    fn default() -> Self {
        Self {
            base_url: "https://finnhub.io/api/v1".to_string(),
            api_key: None,
            endpoints: vec![EndpointConfig {
                name: SEARCH_SYMBOL_ENDPOINT.to_string(),
                url: "search".to_string(),
                is_active: true,
                description: Some("Symbol lookup by free-text query".to_string()),
            }],
            timeout_seconds: 30,
            retry: RetryConfig::default(),
            circuit_breaker: CircuitBreakerSettings::default(),
        }
    }
}

impl FinnhubConfig {
    /// Find the active endpoint with the given name.
    ///
    /// The first active match wins; inactive entries are skipped.
    pub fn active_endpoint(&self, name: &str) -> Option<&EndpointConfig> {
        self.endpoints
            .iter()
            .find(|e| e.is_active && e.name == name)
    }

    /// Per-attempt request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_timestamps: true,
        }
    }
}

impl LoggingConfig {
    /// Read only the logging variables, so a subscriber can be installed
    /// before the rest of the configuration emits warnings.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut logging = Self::default();
        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            logging.level = level;
        }
        if let Ok(raw) = std::env::var("MCP_LOG_TIMESTAMPS") {
            logging.with_timestamps = raw.to_lowercase() != "false" && raw != "0";
        }
        logging
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "finnhub-mcp-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig::default(),
            transport: TransportConfig::default(),
            finnhub: FinnhubConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `MCP_`.
    /// For example: `MCP_SERVER_NAME`, `MCP_LOG_LEVEL`, `MCP_FINNHUB_API_KEY`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        config.logging = LoggingConfig::from_env();

        // Load transport configuration from environment
        config.transport = TransportConfig::from_env();

        config.finnhub.apply_env();

        config
    }
}

impl FinnhubConfig {
    fn apply_env(&mut self) {
        if let Ok(base_url) = std::env::var("MCP_FINNHUB_BASE_URL") {
            self.base_url = base_url;
        }

        let api_key = std::env::var("MCP_FINNHUB_API_KEY")
            .or_else(|_| std::env::var("FINNHUB_API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty());
        match api_key {
            Some(key) => {
                self.api_key = Some(key);
                info!("FinnHub API key loaded from environment");
            }
            None => warn!(
                "MCP_FINNHUB_API_KEY not set - provider requests will be unauthenticated \
                 (get a key at https://finnhub.io/register)"
            ),
        }

        if let Ok(raw) = std::env::var("MCP_FINNHUB_ENDPOINTS") {
            match serde_json::from_str::<Vec<EndpointConfig>>(&raw) {
                Ok(endpoints) => {
                    info!("Loaded {} FinnHub endpoint(s) from environment", endpoints.len());
                    self.endpoints = endpoints;
                }
                Err(e) => warn!("Ignoring malformed MCP_FINNHUB_ENDPOINTS: {}", e),
            }
        }

        if let Some(secs) = parse_env("MCP_FINNHUB_TIMEOUT_SECS") {
            self.timeout_seconds = secs;
        }
        if let Some(retries) = parse_env("MCP_FINNHUB_MAX_RETRIES") {
            self.retry.max_retries = retries;
        }
        if let Some(threshold) = parse_env("MCP_FINNHUB_CIRCUIT_THRESHOLD") {
            self.circuit_breaker.failure_threshold = threshold;
        }
        if let Some(cooldown) = parse_env("MCP_FINNHUB_CIRCUIT_COOLDOWN_SECS") {
            self.circuit_breaker.cooldown_secs = cooldown;
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid value for {}: {:?}", name, raw);
            None
        }
    }
}
