//! Approximate sliding window limiter.
//!
//! Each identity maps to the timestamps of its recent admitted attempts.
//! Pruning is lazy: a window only shrinks when that identity is next
//! queried, so an identity that goes quiet holds at most `max_requests`
//! timestamps until process restart. Acceptable for a 60s window.

use super::config::RateLimitConfig;
use crate::clock::Clock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Per-identity sliding window request throttle.
pub struct SlidingWindow {
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
    windows: Mutex<HashMap<String, Vec<u64>>>,
}

impl SlidingWindow {
    pub fn new(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Check and record one attempt for `identity`.
    ///
    /// Retains only timestamps inside the trailing window, then rejects
    /// without mutation if the identity is at its limit; otherwise records
    /// `now` and allows. The whole filter-then-append sequence runs under
    /// one lock so concurrent callers cannot both slip under the limit.
    pub async fn allow(&self, identity: &str) -> bool {
        let now = self.clock.now_millis();
        let cutoff = now.saturating_sub(self.config.window_millis());

        let mut windows = self.windows.lock().await;
        let timestamps = windows.entry(identity.to_string()).or_default();
        timestamps.retain(|&t| t > cutoff);

        if timestamps.len() >= self.config.max_requests as usize {
            tracing::debug!(identity, "rate limit exceeded");
            return false;
        }

        timestamps.push(now);
        true
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn limiter(max: u32, window_seconds: u64) -> (SlidingWindow, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let config = RateLimitConfig::builder()
            .max_requests(max)
            .window_seconds(window_seconds)
            .build();
        (SlidingWindow::new(config, clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_allows_up_to_limit() {
        let (limiter, _clock) = limiter(5, 60);

        for i in 0..5 {
            assert!(limiter.allow("1.2.3.4").await, "request {} should pass", i + 1);
        }
        assert!(!limiter.allow("1.2.3.4").await, "6th request should be rejected");
    }

    #[tokio::test]
    async fn test_rejection_does_not_consume_quota() {
        let (limiter, clock) = limiter(2, 60);

        assert!(limiter.allow("a").await);
        assert!(limiter.allow("a").await);
        // Rejected attempts leave the window untouched, so quota comes back
        // exactly one window after the admitted attempts, not the rejected ones.
        assert!(!limiter.allow("a").await);
        assert!(!limiter.allow("a").await);

        clock.advance(60_001);
        assert!(limiter.allow("a").await);
    }

    #[tokio::test]
    async fn test_identities_are_isolated() {
        let (limiter, _clock) = limiter(1, 60);

        assert!(limiter.allow("1.2.3.4").await);
        assert!(!limiter.allow("1.2.3.4").await);
        assert!(limiter.allow("5.6.7.8").await, "other identity has its own window");
    }

    #[tokio::test]
    async fn test_window_slides() {
        let (limiter, clock) = limiter(2, 60);

        assert!(limiter.allow("a").await);
        clock.advance(30_000);
        assert!(limiter.allow("a").await);
        assert!(!limiter.allow("a").await);

        // First timestamp falls out of the window; one slot frees up.
        clock.advance(31_000);
        assert!(limiter.allow("a").await);
        assert!(!limiter.allow("a").await);
    }

    #[tokio::test]
    async fn test_lazy_prune_bounds_stored_timestamps() {
        let (limiter, clock) = limiter(3, 60);

        for _ in 0..3 {
            assert!(limiter.allow("a").await);
        }
        clock.advance(120_000);
        assert!(limiter.allow("a").await);

        let windows = limiter.windows.lock().await;
        assert_eq!(windows.get("a").map(Vec::len), Some(1));
    }
}
