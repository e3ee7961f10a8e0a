//! Weekly-resetting water-usage counter over a shared key-value store.
//!
//! The persisted record self-heals: every read and write first checks the
//! stored week-start against the current week and resets a stale record to
//! zero, so the counter is correct no matter which call site touches it
//! first after a week boundary.

mod week;

pub use week::{week_start_ms, WEEK_MS};

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::storage::KeyValueStore;

/// Hard ceiling on the accumulated weekly counter, in milliliters
pub const CAPACITY_ML: u32 = 50_000;

/// Milliliters credited per accepted usage event
pub const DEFAULT_INCREMENT_ML: u32 = 50;

/// Storage key holding the current week-start timestamp (ms since epoch)
pub const KEY_WEEK_START: &str = "weeklyResetAt";

/// Storage key holding the accumulated milliliters for the current week
pub const KEY_VALUE_ML: &str = "weeklyWaterMl";

/// Persisted weekly counter record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeeklyCounter {
    /// Monday 00:00 boundary this accumulation belongs to (ms epoch, 0 = never set)
    pub week_start_ms: i64,
    /// Accumulated milliliters, within `[0, CAPACITY_ML]`
    pub value_ml: u32,
}

impl WeeklyCounter {
    /// Decode from a storage record. Missing or ill-typed fields resolve to
    /// zero; out-of-range values are clamped into the valid domain.
    pub fn from_record(record: &HashMap<String, Value>) -> Self {
        let week_start_ms = record
            .get(KEY_WEEK_START)
            .and_then(Value::as_i64)
            .unwrap_or(0);
        let value_ml = record
            .get(KEY_VALUE_ML)
            .and_then(Value::as_u64)
            .map(|v| v.min(CAPACITY_ML as u64) as u32)
            .unwrap_or(0);
        Self {
            week_start_ms,
            value_ml,
        }
    }

    /// Encode into a storage record
    pub fn to_record(&self) -> HashMap<String, Value> {
        HashMap::from([
            (KEY_WEEK_START.to_string(), Value::from(self.week_start_ms)),
            (KEY_VALUE_ML.to_string(), Value::from(self.value_ml)),
        ])
    }

    /// Whether this record no longer belongs to the current week
    fn is_stale(&self, now_ms: i64, current_week_start_ms: i64) -> bool {
        self.week_start_ms == 0
            || self.week_start_ms != current_week_start_ms
            || now_ms - self.week_start_ms > WEEK_MS
    }
}

/// Weekly usage accumulator shared by the background watcher and any UI
/// read path, with no coordination between call sites.
///
/// Two concurrent `increment` calls can race (both read the same value, the
/// later write clobbers the earlier one). The counter is a best-effort
/// gauge, not a ledger, so the lost update is accepted.
pub struct UsageCounter<S, C> {
    store: S,
    clock: C,
}

impl<S: KeyValueStore, C: Clock> UsageCounter<S, C> {
    /// Create a counter over `store`, timing week boundaries with `clock`
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Read the stored record, resetting it first if it belongs to a past
    /// week. Idempotent: a second call within the same week performs no
    /// write. Storage failures degrade to the zero record.
    pub async fn ensure_fresh(&self) -> WeeklyCounter {
        let stored = match self.store.get(&[KEY_WEEK_START, KEY_VALUE_ML]).await {
            Ok(record) => WeeklyCounter::from_record(&record),
            Err(err) => {
                warn!("counter read failed, treating as empty: {err}");
                WeeklyCounter::default()
            }
        };

        let now_ms = self.clock.now_ms();
        let current = week_start_ms(now_ms, self.clock.offset());
        if !stored.is_stale(now_ms, current) {
            return stored;
        }

        if stored.week_start_ms != 0 {
            debug!(
                old_week = stored.week_start_ms,
                new_week = current,
                "weekly counter reset"
            );
        }
        let fresh = WeeklyCounter {
            week_start_ms: current,
            value_ml: 0,
        };
        self.persist(fresh).await;
        fresh
    }

    /// Credit `amount_ml`, clamped at [`CAPACITY_ML`]. Excess past the
    /// ceiling is silently discarded, never an error.
    pub async fn increment(&self, amount_ml: u32) -> WeeklyCounter {
        let current = self.ensure_fresh().await;
        let next = WeeklyCounter {
            week_start_ms: current.week_start_ms,
            value_ml: current
                .value_ml
                .saturating_add(amount_ml)
                .min(CAPACITY_ML),
        };
        self.persist(next).await;
        next
    }

    /// Current record for display. Performs the same staleness check as the
    /// write path, so stale counters heal on read too.
    pub async fn read(&self) -> WeeklyCounter {
        self.ensure_fresh().await
    }

    async fn persist(&self, counter: WeeklyCounter) {
        if let Err(err) = self.store.set(counter.to_record()).await {
            warn!("counter write failed, value not persisted: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::{MemoryStore, StoreChange, StoreError};
    use async_trait::async_trait;
    use chrono::{Offset, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tokio::sync::broadcast;

    fn monday(y: i32, mo: u32, d: u32) -> i64 {
        Utc.with_ymd_and_hms(y, mo, d, 0, 0, 0)
            .single()
            .expect("valid test date")
            .timestamp_millis()
    }

    fn counter_at(
        store: MemoryStore,
        now_ms: i64,
    ) -> (UsageCounter<MemoryStore, Arc<ManualClock>>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::utc(now_ms));
        (UsageCounter::new(store, Arc::clone(&clock)), clock)
    }

    #[tokio::test]
    async fn test_fresh_install_resets_to_current_week() {
        let this_monday = monday(2024, 1, 8);
        let (counter, _) = counter_at(MemoryStore::new(), this_monday + 3_600_000);

        let record = counter.read().await;
        assert_eq!(record.week_start_ms, this_monday);
        assert_eq!(record.value_ml, 0);
    }

    #[tokio::test]
    async fn test_serial_increments_accumulate_and_clamp() {
        let this_monday = monday(2024, 1, 8);
        let (counter, _) = counter_at(MemoryStore::new(), this_monday + 1_000);

        for _ in 0..4 {
            counter.increment(50).await;
        }
        assert_eq!(counter.read().await.value_ml, 200);

        // Push to just under capacity, then overflow
        counter.increment(CAPACITY_ML - 220).await;
        assert_eq!(counter.read().await.value_ml, CAPACITY_ML - 20);
        let clamped = counter.increment(50).await;
        assert_eq!(clamped.value_ml, CAPACITY_ML);
    }

    #[tokio::test]
    async fn test_increment_near_capacity_clamps_exactly() {
        let this_monday = monday(2024, 1, 8);
        let store = MemoryStore::new();
        store
            .set(
                WeeklyCounter {
                    week_start_ms: this_monday,
                    value_ml: 49_980,
                }
                .to_record(),
            )
            .await
            .expect("seed store");
        let (counter, _) = counter_at(store, this_monday + 1_000);

        let record = counter.increment(50).await;
        assert_eq!(record.value_ml, 50_000);
    }

    #[tokio::test]
    async fn test_week_boundary_crossing_resets() {
        let last_monday = monday(2024, 1, 1);
        let this_monday = monday(2024, 1, 8);
        let store = MemoryStore::new();
        store
            .set(
                WeeklyCounter {
                    week_start_ms: last_monday,
                    value_ml: 1_234,
                }
                .to_record(),
            )
            .await
            .expect("seed store");

        // One hour into the new week
        let (counter, _) = counter_at(store, this_monday + 3_600_000);
        let record = counter.ensure_fresh().await;
        assert_eq!(record.week_start_ms, this_monday);
        assert_eq!(record.value_ml, 0);
    }

    #[tokio::test]
    async fn test_increment_after_boundary_starts_from_zero() {
        let last_monday = monday(2024, 1, 1);
        let store = MemoryStore::new();
        store
            .set(
                WeeklyCounter {
                    week_start_ms: last_monday,
                    value_ml: 4_000,
                }
                .to_record(),
            )
            .await
            .expect("seed store");

        let (counter, clock) = counter_at(store, last_monday + 1_000);
        assert_eq!(counter.read().await.value_ml, 4_000);

        clock.advance(WEEK_MS + 60_000);
        let record = counter.increment(50).await;
        assert_eq!(record.week_start_ms, monday(2024, 1, 8));
        assert_eq!(record.value_ml, 50);
    }

    #[tokio::test]
    async fn test_ensure_fresh_is_idempotent_when_already_fresh() {
        let this_monday = monday(2024, 1, 8);
        let store = MemoryStore::new();
        let mut changes = store.subscribe();
        let (counter, _) = counter_at(store, this_monday + 1_000);

        counter.ensure_fresh().await;
        assert!(changes.try_recv().is_ok(), "first call writes the reset");
        counter.ensure_fresh().await;
        assert!(
            changes.try_recv().is_err(),
            "second call must not write again"
        );
    }

    #[tokio::test]
    async fn test_from_record_defaults_and_clamps() {
        let empty = HashMap::new();
        assert_eq!(WeeklyCounter::from_record(&empty), WeeklyCounter::default());

        let bad = HashMap::from([
            (KEY_WEEK_START.to_string(), Value::from("not a number")),
            (KEY_VALUE_ML.to_string(), Value::from(9_000_000u64)),
        ]);
        let record = WeeklyCounter::from_record(&bad);
        assert_eq!(record.week_start_ms, 0);
        assert_eq!(record.value_ml, CAPACITY_ML);
    }

    /// Store whose operations always fail, for the degraded path
    struct BrokenStore {
        changes: broadcast::Sender<StoreChange>,
    }

    impl BrokenStore {
        fn new() -> Self {
            Self {
                changes: broadcast::channel(1).0,
            }
        }
    }

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _keys: &[&str]) -> Result<HashMap<String, Value>, StoreError> {
            Err(StoreError::Io(std::io::Error::other("store offline")))
        }

        async fn set(&self, _entries: HashMap<String, Value>) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("store offline")))
        }

        fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
            self.changes.subscribe()
        }
    }

    #[tokio::test]
    async fn test_storage_failure_degrades_to_zero() {
        let this_monday = monday(2024, 1, 8);
        let clock = Arc::new(ManualClock::utc(this_monday + 1_000));
        let counter = UsageCounter::new(BrokenStore::new(), clock);

        let record = counter.read().await;
        assert_eq!(record.week_start_ms, this_monday);
        assert_eq!(record.value_ml, 0);

        // Increments still resolve instead of erroring
        let record = counter.increment(50).await;
        assert_eq!(record.value_ml, 50);
    }

    #[test]
    fn test_offset_affects_week_start() {
        let jst = chrono::FixedOffset::east_opt(9 * 3600).expect("JST");
        let now = jst
            .with_ymd_and_hms(2024, 1, 8, 0, 30, 0)
            .single()
            .expect("valid test date")
            .timestamp_millis();
        assert_ne!(week_start_ms(now, jst), week_start_ms(now, Utc.fix()));
    }
}
