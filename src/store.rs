//! Bounded, time-decaying in-memory store of accepted donations.
//!
//! Events live in arrival order. Capacity overflow evicts the oldest entry
//! (FIFO, regardless of processed state or remaining lifetime) and every
//! access sweeps entries past their TTL. Eviction can drop an event the
//! consumer never retrieved; bounded memory wins over durability here and
//! the polling client is expected to tolerate it.

use crate::clock::Clock;
use crate::validation::DonationPayload;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// An accepted donation.
///
/// Created only by [`EventStore::admit`]; the processed flag is flipped only
/// by [`EventStore::take_unprocessed`] and flips false to true exactly once.
#[derive(Debug, Clone, Serialize)]
pub struct DonationEvent {
    pub id: Uuid,
    pub donor_name: String,
    pub amount: i64,
    pub message: Option<String>,
    /// Admission time in milliseconds; non-decreasing in insertion order.
    pub accepted_at: u64,
    pub processed: bool,
}

/// Public projection returned to the polling consumer. Omits `processed`.
#[derive(Debug, Clone, Serialize)]
pub struct DonationView {
    pub id: Uuid,
    pub donor_name: String,
    pub amount: i64,
    pub message: Option<String>,
    pub timestamp: u64,
}

impl From<DonationEvent> for DonationView {
    fn from(event: DonationEvent) -> Self {
        Self {
            id: event.id,
            donor_name: event.donor_name,
            amount: event.amount,
            message: event.message,
            timestamp: event.accepted_at,
        }
    }
}

/// Store limits: capacity in events, lifetime in milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct StoreLimits {
    pub capacity: usize,
    pub ttl_millis: u64,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            capacity: 100,
            ttl_millis: 5 * 60 * 1_000,
        }
    }
}

/// Ordered collection of accepted events with FIFO eviction and TTL decay.
pub struct EventStore {
    limits: StoreLimits,
    clock: Arc<dyn Clock>,
    events: Mutex<VecDeque<DonationEvent>>,
}

impl EventStore {
    pub fn new(limits: StoreLimits, clock: Arc<dyn Clock>) -> Self {
        Self {
            limits,
            clock,
            events: Mutex::new(VecDeque::new()),
        }
    }

    /// Admit a validated payload as a new event.
    ///
    /// Generates a fresh random id (never derived from client input), trims
    /// the donor name and message, stamps the admission time, sweeps expired
    /// entries, then appends and evicts the oldest entry if over capacity.
    pub async fn admit(&self, payload: DonationPayload) -> DonationEvent {
        let now = self.clock.now_millis();
        let event = DonationEvent {
            id: Uuid::new_v4(),
            donor_name: payload.donor_name.trim().to_string(),
            amount: payload.amount,
            message: payload.message.map(|m| m.trim().to_string()),
            accepted_at: now,
            processed: false,
        };

        let mut events = self.events.lock().await;
        Self::sweep_expired(&mut events, now, self.limits.ttl_millis);

        events.push_back(event.clone());
        while events.len() > self.limits.capacity {
            if let Some(evicted) = events.pop_front() {
                tracing::debug!(
                    event_id = %evicted.id,
                    processed = evicted.processed,
                    "store at capacity, evicting oldest event"
                );
            }
        }

        event
    }

    /// Return all unprocessed events in admission order and mark them
    /// processed.
    ///
    /// The filter and the flag flip happen under one lock, so an event is
    /// returned at most once across the process lifetime: two concurrent
    /// callers can never both observe the same event as unprocessed.
    pub async fn take_unprocessed(&self) -> Vec<DonationEvent> {
        let now = self.clock.now_millis();

        let mut events = self.events.lock().await;
        Self::sweep_expired(&mut events, now, self.limits.ttl_millis);

        let mut taken = Vec::new();
        for event in events.iter_mut() {
            if !event.processed {
                event.processed = true;
                taken.push(event.clone());
            }
        }
        taken
    }

    /// Number of live (unexpired) events.
    pub async fn len(&self) -> usize {
        let now = self.clock.now_millis();
        let mut events = self.events.lock().await;
        Self::sweep_expired(&mut events, now, self.limits.ttl_millis);
        events.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn sweep_expired(events: &mut VecDeque<DonationEvent>, now: u64, ttl_millis: u64) {
        // Expiry ignores the processed flag.
        events.retain(|e| now.saturating_sub(e.accepted_at) < ttl_millis);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::collections::HashSet;

    fn store(capacity: usize, ttl_millis: u64) -> (EventStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let limits = StoreLimits {
            capacity,
            ttl_millis,
        };
        (EventStore::new(limits, clock.clone()), clock)
    }

    fn payload(donor_name: &str, amount: i64) -> DonationPayload {
        DonationPayload {
            donor_name: donor_name.to_string(),
            amount,
            message: None,
        }
    }

    #[tokio::test]
    async fn test_admit_stamps_and_trims() {
        let (store, clock) = store(100, 300_000);
        let event = store
            .admit(DonationPayload {
                donor_name: "  Alice  ".to_string(),
                amount: 500,
                message: Some("  gg  ".to_string()),
            })
            .await;

        assert_eq!(event.donor_name, "Alice");
        assert_eq!(event.message.as_deref(), Some("gg"));
        assert_eq!(event.accepted_at, clock.now_millis());
        assert!(!event.processed);
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let (store, _clock) = store(200, 300_000);
        let mut ids = HashSet::new();
        for i in 0..100 {
            let event = store.admit(payload("Alice", i + 1)).await;
            ids.insert(event.id);
        }
        assert_eq!(ids.len(), 100);
    }

    #[tokio::test]
    async fn test_fifo_eviction_at_capacity() {
        let (store, _clock) = store(100, u64::MAX);

        let first = store.admit(payload("donor0", 1)).await;
        for i in 1..101 {
            store.admit(payload(&format!("donor{}", i), i + 1)).await;
        }

        assert_eq!(store.len().await, 100);
        let taken = store.take_unprocessed().await;
        assert_eq!(taken.len(), 100);
        assert!(taken.iter().all(|e| e.id != first.id));
        assert_eq!(taken[0].donor_name, "donor1");
    }

    #[tokio::test]
    async fn test_eviction_ignores_processed_state() {
        let (store, _clock) = store(2, u64::MAX);

        let first = store.admit(payload("a", 1)).await;
        store.take_unprocessed().await; // first is now processed... and still evictable
        store.admit(payload("b", 2)).await;
        store.admit(payload("c", 3)).await;

        let remaining = store.take_unprocessed().await;
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().all(|e| e.id != first.id));
    }

    #[tokio::test]
    async fn test_ttl_expiry_removes_events() {
        let (store, clock) = store(100, 300_000);
        store.admit(payload("Alice", 500)).await;

        clock.advance(300_000);
        assert!(store.take_unprocessed().await.is_empty());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_ttl_expiry_removes_processed_and_unprocessed_alike() {
        let (store, clock) = store(100, 300_000);
        store.admit(payload("a", 1)).await;
        store.take_unprocessed().await;
        store.admit(payload("b", 2)).await;

        clock.advance(300_000);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_take_unprocessed_returns_each_event_once() {
        let (store, _clock) = store(100, 300_000);
        store.admit(payload("Alice", 100)).await;
        store.admit(payload("Bob", 200)).await;

        let first = store.take_unprocessed().await;
        assert_eq!(first.len(), 2);

        let second = store.take_unprocessed().await;
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_take_unprocessed_preserves_admission_order() {
        let (store, clock) = store(100, 300_000);
        for i in 0..5 {
            store.admit(payload(&format!("donor{}", i), i + 1)).await;
            clock.advance(10);
        }

        let taken = store.take_unprocessed().await;
        let timestamps: Vec<u64> = taken.iter().map(|e| e.accepted_at).collect();
        let mut sorted = timestamps.clone();
        sorted.sort_unstable();
        assert_eq!(timestamps, sorted);
    }

    #[tokio::test]
    async fn test_new_admissions_after_take_are_returned() {
        let (store, _clock) = store(100, 300_000);
        store.admit(payload("Alice", 100)).await;
        store.take_unprocessed().await;

        store.admit(payload("Bob", 200)).await;
        let taken = store.take_unprocessed().await;
        assert_eq!(taken.len(), 1);
        assert_eq!(taken[0].donor_name, "Bob");
    }

    #[test]
    fn test_view_omits_processed_flag() {
        let event = DonationEvent {
            id: Uuid::new_v4(),
            donor_name: "Alice".to_string(),
            amount: 500,
            message: None,
            accepted_at: 42,
            processed: true,
        };

        let view: DonationView = event.into();
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("processed").is_none());
        assert_eq!(json["timestamp"], 42);
    }
}
