use serde::{Deserialize, Serialize};

/// Rate limiting configuration for one limiter instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Maximum number of requests allowed per window.
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Trailing window size in seconds.
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,

    /// Trust X-Forwarded-For for client origin detection.
    ///
    /// Only enable this behind a reverse proxy that overwrites (not appends
    /// to) the header; otherwise senders can spoof their origin and bypass
    /// per-origin limiting. Default: `false`.
    #[serde(default)]
    pub trust_proxy: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_seconds: default_window_seconds(),
            trust_proxy: false,
        }
    }
}

impl RateLimitConfig {
    pub fn builder() -> RateLimitConfigBuilder {
        RateLimitConfigBuilder::new()
    }

    /// Limit applied to inbound webhook submissions: 10 per 60s per origin.
    pub fn submission() -> Self {
        Self {
            max_requests: 10,
            window_seconds: 60,
            trust_proxy: false,
        }
    }

    /// Limit applied to retrieval polls: 60 per 60s per credential.
    pub fn retrieval() -> Self {
        Self {
            max_requests: 60,
            window_seconds: 60,
            trust_proxy: false,
        }
    }

    pub fn window_millis(&self) -> u64 {
        self.window_seconds * 1_000
    }
}

/// Builder for [`RateLimitConfig`].
#[must_use = "builder does nothing until you call build()"]
pub struct RateLimitConfigBuilder {
    config: RateLimitConfig,
}

impl RateLimitConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RateLimitConfig::default(),
        }
    }

    pub fn max_requests(mut self, max: u32) -> Self {
        self.config.max_requests = max;
        self
    }

    pub fn window_seconds(mut self, seconds: u64) -> Self {
        self.config.window_seconds = seconds;
        self
    }

    /// Trust X-Forwarded-For for origin detection. See
    /// [`RateLimitConfig::trust_proxy`] before enabling.
    pub fn trust_proxy(mut self, trust: bool) -> Self {
        self.config.trust_proxy = trust;
        self
    }

    pub fn build(self) -> RateLimitConfig {
        self.config
    }
}

impl Default for RateLimitConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn default_max_requests() -> u32 {
    10
}

fn default_window_seconds() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_preset() {
        let config = RateLimitConfig::submission();
        assert_eq!(config.max_requests, 10);
        assert_eq!(config.window_seconds, 60);
        assert!(!config.trust_proxy);
    }

    #[test]
    fn test_retrieval_preset() {
        let config = RateLimitConfig::retrieval();
        assert_eq!(config.max_requests, 60);
        assert_eq!(config.window_seconds, 60);
    }

    #[test]
    fn test_builder() {
        let config = RateLimitConfig::builder()
            .max_requests(5)
            .window_seconds(30)
            .trust_proxy(true)
            .build();

        assert_eq!(config.max_requests, 5);
        assert_eq!(config.window_seconds, 30);
        assert!(config.trust_proxy);
        assert_eq!(config.window_millis(), 30_000);
    }

    #[test]
    fn test_trust_proxy_defaults_false() {
        // trust_proxy must default to false to prevent origin spoofing
        // via X-Forwarded-For manipulation.
        assert!(!RateLimitConfig::default().trust_proxy);
        assert!(!RateLimitConfig::builder().build().trust_proxy);
    }
}
