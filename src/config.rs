use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::ratelimit::RateLimitConfig;
use crate::utils::get_env_with_prefix;

/// Main configuration for the donation bridge.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub webhook: WebhookConfig,
    pub retrieval: RetrievalConfig,
    pub submission_limit: RateLimitConfig,
    pub retrieval_limit: RateLimitConfig,
    pub store: StoreConfig,
    pub dedup: DedupConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum request body size in bytes (default: 64KB - donation
    /// payloads are tiny).
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

/// Inbound webhook settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WebhookConfig {
    /// Shared signing secret. When absent, signature verification is
    /// skipped entirely - a deployment policy for providers that cannot
    /// sign their callbacks, logged loudly at runtime.
    pub secret: Option<String>,
}

/// Retrieval endpoint settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RetrievalConfig {
    /// API key the polling consumer must present. Required; `build()`
    /// rejects an empty value.
    pub api_key: String,
}

/// Event store limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_capacity")]
    pub capacity: usize,
    #[serde(default = "default_store_ttl_seconds")]
    pub ttl_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: default_store_capacity(),
            ttl_seconds: default_store_ttl_seconds(),
        }
    }
}

impl StoreConfig {
    pub fn ttl_millis(&self) -> u64 {
        self.ttl_seconds * 1_000
    }
}

/// Duplicate suppression settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DedupConfig {
    #[serde(default = "default_dedup_window_seconds")]
    pub window_seconds: u64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            window_seconds: default_dedup_window_seconds(),
        }
    }
}

impl DedupConfig {
    pub fn window_millis(&self) -> u64 {
        self.window_seconds * 1_000
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            webhook: WebhookConfig::default(),
            retrieval: RetrievalConfig::default(),
            submission_limit: RateLimitConfig::submission(),
            retrieval_limit: RateLimitConfig::retrieval(),
            store: StoreConfig::default(),
            dedup: DedupConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_size: default_max_body_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_body_size() -> usize {
    64 * 1024
}

fn default_store_capacity() -> usize {
    100
}

fn default_store_ttl_seconds() -> u64 {
    300
}

fn default_dedup_window_seconds() -> u64 {
    600
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// Builder for [`Config`] with environment variable support.
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.config.server.max_body_size = max_body_size;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.webhook.secret = Some(secret.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.retrieval.api_key = api_key.into();
        self
    }

    pub fn with_submission_limit(mut self, limit: RateLimitConfig) -> Self {
        self.config.submission_limit = limit;
        self
    }

    pub fn with_retrieval_limit(mut self, limit: RateLimitConfig) -> Self {
        self.config.retrieval_limit = limit;
        self
    }

    pub fn with_store_capacity(mut self, capacity: usize) -> Self {
        self.config.store.capacity = capacity;
        self
    }

    pub fn with_store_ttl_seconds(mut self, ttl_seconds: u64) -> Self {
        self.config.store.ttl_seconds = ttl_seconds;
        self
    }

    pub fn with_dedup_window_seconds(mut self, window_seconds: u64) -> Self {
        self.config.dedup.window_seconds = window_seconds;
        self
    }

    /// Load configuration from environment variables with PLEDGEWAY_ prefix.
    pub fn from_env(mut self) -> Self {
        if let Some(host) = get_env_with_prefix("HOST") {
            self.config.server.host = host;
        }
        if let Some(port) = get_env_with_prefix("PORT") {
            if let Ok(p) = port.parse() {
                self.config.server.port = p;
            }
        }
        if let Some(max_body_size) = get_env_with_prefix("MAX_BODY_SIZE") {
            if let Ok(size) = max_body_size.parse() {
                self.config.server.max_body_size = size;
            }
        }
        if let Some(level) = get_env_with_prefix("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(json) = get_env_with_prefix("LOG_JSON") {
            self.config.logging.json = json.parse().unwrap_or(false);
        }
        if let Some(secret) = get_env_with_prefix("WEBHOOK_SECRET") {
            if !secret.is_empty() {
                self.config.webhook.secret = Some(secret);
            }
        }
        if let Some(api_key) = get_env_with_prefix("API_KEY") {
            self.config.retrieval.api_key = api_key;
        }
        if let Some(max) = get_env_with_prefix("SUBMISSION_MAX_REQUESTS") {
            if let Ok(val) = max.parse() {
                self.config.submission_limit.max_requests = val;
            }
        }
        if let Some(window) = get_env_with_prefix("SUBMISSION_WINDOW_SECONDS") {
            if let Ok(val) = window.parse() {
                self.config.submission_limit.window_seconds = val;
            }
        }
        if let Some(trust) = get_env_with_prefix("TRUST_PROXY") {
            self.config.submission_limit.trust_proxy = trust.parse().unwrap_or(false);
        }
        if let Some(max) = get_env_with_prefix("RETRIEVAL_MAX_REQUESTS") {
            if let Ok(val) = max.parse() {
                self.config.retrieval_limit.max_requests = val;
            }
        }
        if let Some(window) = get_env_with_prefix("RETRIEVAL_WINDOW_SECONDS") {
            if let Ok(val) = window.parse() {
                self.config.retrieval_limit.window_seconds = val;
            }
        }
        if let Some(capacity) = get_env_with_prefix("STORE_CAPACITY") {
            if let Ok(val) = capacity.parse() {
                self.config.store.capacity = val;
            }
        }
        if let Some(ttl) = get_env_with_prefix("STORE_TTL_SECONDS") {
            if let Ok(val) = ttl.parse() {
                self.config.store.ttl_seconds = val;
            }
        }
        if let Some(window) = get_env_with_prefix("DEDUP_WINDOW_SECONDS") {
            if let Ok(val) = window.parse() {
                self.config.dedup.window_seconds = val;
            }
        }

        self
    }

    /// Build the configuration, validating all settings.
    pub fn build(self) -> crate::error::Result<Config> {
        use crate::error::PledgewayError;

        self.config.server.addr().map_err(|e| {
            PledgewayError::bad_request(format!(
                "Invalid server address {}:{} - {}",
                self.config.server.host, self.config.server.port, e
            ))
        })?;

        if self.config.server.port == 0 {
            return Err(PledgewayError::bad_request(
                "Server port must be greater than 0",
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.config.logging.level.to_lowercase().as_str()) {
            return Err(PledgewayError::bad_request(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.config.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        if self.config.retrieval.api_key.is_empty() {
            return Err(PledgewayError::bad_request(
                "Retrieval API key must be configured (PLEDGEWAY_API_KEY)",
            ));
        }

        for (name, limit) in [
            ("submission", &self.config.submission_limit),
            ("retrieval", &self.config.retrieval_limit),
        ] {
            if limit.max_requests == 0 {
                return Err(PledgewayError::bad_request(format!(
                    "{} rate limit max_requests must be greater than 0",
                    name
                )));
            }
            if limit.window_seconds == 0 {
                return Err(PledgewayError::bad_request(format!(
                    "{} rate limit window_seconds must be greater than 0",
                    name
                )));
            }
        }

        if self.config.store.capacity == 0 {
            return Err(PledgewayError::bad_request(
                "Store capacity must be greater than 0",
            ));
        }
        if self.config.store.ttl_seconds == 0 {
            return Err(PledgewayError::bad_request(
                "Store TTL must be greater than 0",
            ));
        }
        if self.config.dedup.window_seconds == 0 {
            return Err(PledgewayError::bad_request(
                "Duplicate suppression window must be greater than 0",
            ));
        }

        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
