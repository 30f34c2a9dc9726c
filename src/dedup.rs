//! Short-horizon duplicate suppression for webhook retries.
//!
//! Payment providers redeliver a webhook when they miss the acknowledgment,
//! so the same logical donation can arrive twice. This set remembers
//! recently seen submissions and lets the handler acknowledge the repeat
//! without admitting it again. It is separate from the event store's own
//! TTL: this bounds re-admission, the store bounds memory.

use crate::clock::Clock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Membership set of recently seen submission keys.
///
/// Entries expire after a fixed window; expired entries are swept on each
/// access rather than by a background timer, keeping behavior deterministic
/// under an injected clock.
pub struct DuplicateSuppressor {
    window_millis: u64,
    clock: Arc<dyn Clock>,
    seen: Mutex<HashMap<String, u64>>,
}

impl DuplicateSuppressor {
    pub fn new(window_millis: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            window_millis,
            clock,
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Returns `true` if `key` was already recorded inside the window.
    ///
    /// In both cases the key is present afterwards, so a burst of identical
    /// retries collapses to a single admission. Check and insert happen
    /// under one lock; two concurrent deliveries of the same key cannot
    /// both come back "unseen".
    pub async fn seen_and_record(&self, key: &str) -> bool {
        let now = self.clock.now_millis();
        let cutoff = now.saturating_sub(self.window_millis);

        let mut seen = self.seen.lock().await;
        seen.retain(|_, &mut recorded_at| recorded_at > cutoff);

        if seen.contains_key(key) {
            return true;
        }

        seen.insert(key.to_string(), now);
        false
    }
}

/// Deterministic composite key for a submission.
///
/// The storage id is generated only after the duplicate check passes, so it
/// cannot be used here. Instead the key combines the donor name, the amount,
/// and a one-minute bucket of the arrival time - enough to fold provider
/// retries together without colliding distinct donations from the same donor
/// minutes apart.
pub fn submission_key(donor_name: &str, amount: i64, now_millis: u64) -> String {
    format!("{}|{}|{}", donor_name.trim(), amount, now_millis / 60_000)
}
