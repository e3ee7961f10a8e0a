//! Core library for waterwatch: classify browser activity against a set of
//! AI-service host patterns, debounce duplicate detections, and maintain a
//! weekly-resetting "water usage" counter in a key-value store.
//!
//! The host (see the `waterwatch` binary) feeds [`ActivitySignal`]s into an
//! [`ActivityWatcher`]; accepted detections credit the [`UsageCounter`],
//! which self-heals across week boundaries on both the read and write path.

pub mod clock;
pub mod config;
pub mod counter;
pub mod detector;
pub mod gauge;
pub mod storage;
pub mod watcher;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::WatchSettings;
pub use counter::{
    week_start_ms, UsageCounter, WeeklyCounter, CAPACITY_ML, DEFAULT_INCREMENT_ML, KEY_VALUE_ML,
    KEY_WEEK_START, WEEK_MS,
};
pub use detector::{ActivitySignal, Detector, MatchSet, COOLDOWN_MS, DEFAULT_MATCH_PATTERNS};
pub use gauge::Gauge;
pub use storage::{FileStore, KeyValueStore, MemoryStore, StoreChange, StoreError};
pub use watcher::ActivityWatcher;
