//! Pledgeway - donation webhook ingestion and retrieval bridge.
//!
//! A payment-notification provider pushes donation events via signed HTTP
//! callbacks; a game-server process later retrieves unprocessed events over
//! a second authenticated endpoint. The admission pipeline verifies the
//! signature, rate-limits per origin, suppresses provider retries, validates
//! the payload, and appends to a bounded, time-decaying in-memory store with
//! at-most-once delivery to the polling consumer.
//!
//! Storage is memory-resident and volatile by requirement: bounded memory is
//! chosen over durability, and evicted events are accepted data loss.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pledgeway::{App, ConfigBuilder};
//!
//! #[tokio::main]
//! async fn main() {
//!     pledgeway::init_tracing();
//!
//!     let config = ConfigBuilder::new()
//!         .from_env()
//!         .build()
//!         .expect("invalid configuration");
//!
//!     App::with_config(config).serve().await.unwrap();
//! }
//! ```

mod app;
pub mod clock;
mod config;
pub mod cors;
pub mod dedup;
mod error;
pub mod ratelimit;
mod routes;
pub mod signature;
pub mod store;
pub mod testing;
mod utils;
pub mod validation;

// Re-exports for the public API
pub use app::{App, AppState};
pub use config::{
    Config, ConfigBuilder, DedupConfig, LoggingConfig, RetrievalConfig, ServerConfig, StoreConfig,
    WebhookConfig,
};
pub use error::{PledgewayError, Result};
pub use ratelimit::{RateLimitConfig, RateLimitConfigBuilder, SlidingWindow};
pub use routes::{DonationsResponse, SubmitResponse};
pub use signature::{HmacSha256Verifier, NoVerification, SignatureVerifier};
pub use store::{DonationEvent, DonationView, EventStore, StoreLimits};
pub use validation::DonationPayload;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults.
///
/// Call early in `main()`, before creating the [`App`].
///
/// # Environment Variables
///
/// - `RUST_LOG`: log level filter (e.g. "info", "pledgeway=debug")
/// - `PLEDGEWAY_LOG_JSON`: set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("PLEDGEWAY_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Initialize tracing from a built [`Config`].
pub fn init_tracing_with_config(config: &Config) {
    let env_filter = EnvFilter::new(&config.logging.level);

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
