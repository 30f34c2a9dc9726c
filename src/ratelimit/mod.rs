//! Per-identity sliding window rate limiting.
//!
//! Two independent limiter instances exist: one for webhook submissions
//! (keyed by client origin) and one for retrieval polls (keyed by a hash of
//! the presented credential).

mod config;
mod window;

pub use config::{RateLimitConfig, RateLimitConfigBuilder};
pub use window::SlidingWindow;
