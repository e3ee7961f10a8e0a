//! Injectable wall-clock time and week-boundary timezone.
//!
//! Week boundaries follow the user's local time, so the clock carries the
//! UTC offset alongside the timestamp. Tests pin both with [`ManualClock`].

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{FixedOffset, Local, Offset, Utc};

/// Source of wall-clock time for detection cooldowns and week boundaries
pub trait Clock: Send + Sync {
    /// Current time in milliseconds since the Unix epoch
    fn now_ms(&self) -> i64;

    /// UTC offset used when computing week boundaries
    fn offset(&self) -> FixedOffset;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }

    fn offset(&self) -> FixedOffset {
        (**self).offset()
    }
}

/// System clock using the host's local timezone offset
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn offset(&self) -> FixedOffset {
        // Re-read per call so a timezone change mid-week re-anchors the boundary
        Local::now().offset().fix()
    }
}

/// Manually advanced clock for tests and deterministic embedders
#[derive(Debug)]
pub struct ManualClock {
    now_ms: AtomicI64,
    offset: FixedOffset,
}

impl ManualClock {
    /// Create a clock pinned at `now_ms` with the given UTC offset
    pub fn new(now_ms: i64, offset: FixedOffset) -> Self {
        Self {
            now_ms: AtomicI64::new(now_ms),
            offset,
        }
    }

    /// Create a clock pinned at `now_ms` in UTC
    pub fn utc(now_ms: i64) -> Self {
        Self::new(now_ms, Utc.fix())
    }

    /// Move the clock to an absolute timestamp
    pub fn set(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    /// Advance the clock by `delta_ms`
    pub fn advance(&self, delta_ms: i64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}
