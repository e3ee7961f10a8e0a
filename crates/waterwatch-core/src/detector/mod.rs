//! Debounced detection of AI-service activity.
//!
//! Raw browser signals are matched against the URL pattern set, then
//! rate-limited per subject key so a burst of events for the same request
//! origin or tab produces a single usage event per cooldown window.

mod patterns;

pub use patterns::{MatchSet, DEFAULT_MATCH_PATTERNS};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::Clock;

/// Minimum spacing between accepted detections for one subject key
pub const COOLDOWN_MS: i64 = 60_000;

/// Raw browser activity observed by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivitySignal {
    /// A network request attributed to `initiator` finished loading `url`
    RequestCompleted { initiator: String, url: String },
    /// A tab finished navigating to `url`
    TabNavigated { tab_id: u32, url: String },
    /// A tab was brought to the foreground; its URL is resolved by the watcher
    TabActivated { tab_id: u32 },
    /// A tab was closed; the watcher drops its registry entry
    TabClosed { tab_id: u32 },
}

/// Classifies activity against the match set and suppresses duplicate
/// detections per subject within the cooldown window.
///
/// The cooldown map is in-memory only and lives for the process lifetime;
/// losing it on restart merely relaxes the rate limit for one window, it is
/// not a correctness guarantee.
pub struct Detector<C> {
    matches: MatchSet,
    clock: C,
    cooldown_ms: i64,
    last_accepted: HashMap<String, i64>,
}

impl<C: Clock> Detector<C> {
    /// Create a detector over `matches`, timing cooldowns with `clock`
    pub fn new(matches: MatchSet, clock: C) -> Self {
        Self {
            matches,
            clock,
            cooldown_ms: COOLDOWN_MS,
            last_accepted: HashMap::new(),
        }
    }

    /// Override the cooldown window
    pub fn with_cooldown(mut self, cooldown_ms: i64) -> Self {
        self.cooldown_ms = cooldown_ms;
        self
    }

    /// Completed network request attributed to `initiator`
    pub fn on_request(&mut self, initiator: &str, url: &str) -> bool {
        self.evaluate(&format!("req:{initiator}"), url)
    }

    /// Tab finished loading `url`
    pub fn on_navigation(&mut self, tab_id: u32, url: &str) -> bool {
        self.evaluate(&format!("tab:{tab_id}"), url)
    }

    /// Tab came to the foreground; `url` is its current URL
    pub fn on_activation(&mut self, tab_id: u32, url: &str) -> bool {
        self.evaluate(&format!("tab:{tab_id}:active"), url)
    }

    /// Match, then debounce. The acceptance timestamp is recorded before
    /// returning, so a near-simultaneous burst for the same subject accepts
    /// only the first signal.
    fn evaluate(&mut self, subject_key: &str, url: &str) -> bool {
        if !self.matches.matches_url(url) {
            return false;
        }
        let now_ms = self.clock.now_ms();
        if let Some(last) = self.last_accepted.get(subject_key) {
            if now_ms - last < self.cooldown_ms {
                return false;
            }
        }
        self.last_accepted
            .insert(subject_key.to_string(), now_ms);
        debug!(subject = subject_key, "usage event accepted");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::Arc;

    fn detector(now_ms: i64) -> (Detector<Arc<ManualClock>>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::utc(now_ms));
        let set = MatchSet::from_patterns(["*.openai.com", "*://claude.ai/*"]);
        (Detector::new(set, Arc::clone(&clock)), clock)
    }

    #[test]
    fn test_duplicate_within_cooldown_suppressed() {
        let (mut detector, clock) = detector(1_000_000);
        assert!(detector.on_navigation(7, "https://chat.openai.com/"));
        assert!(!detector.on_navigation(7, "https://chat.openai.com/"));

        clock.advance(COOLDOWN_MS - 1);
        assert!(!detector.on_navigation(7, "https://chat.openai.com/"));
    }

    #[test]
    fn test_accepted_again_after_cooldown() {
        let (mut detector, clock) = detector(1_000_000);
        assert!(detector.on_navigation(7, "https://chat.openai.com/"));
        clock.advance(COOLDOWN_MS);
        assert!(detector.on_navigation(7, "https://chat.openai.com/"));
    }

    #[test]
    fn test_signal_kinds_debounce_independently() {
        let (mut detector, _) = detector(1_000_000);
        let url = "https://claude.ai/chat";
        // Same underlying tab, three distinct subject keys
        assert!(detector.on_navigation(3, url));
        assert!(detector.on_activation(3, url));
        assert!(detector.on_request("3", url));
        // Each kind is now in cooldown
        assert!(!detector.on_navigation(3, url));
        assert!(!detector.on_activation(3, url));
        assert!(!detector.on_request("3", url));
    }

    #[test]
    fn test_subjects_debounce_independently() {
        let (mut detector, _) = detector(1_000_000);
        assert!(detector.on_navigation(1, "https://claude.ai/"));
        assert!(detector.on_navigation(2, "https://claude.ai/"));
    }

    #[test]
    fn test_non_matching_and_malformed_urls_rejected() {
        let (mut detector, _) = detector(1_000_000);
        assert!(!detector.on_navigation(1, "https://example.com/"));
        assert!(!detector.on_navigation(1, "::::"));
        // A rejection does not start a cooldown
        assert!(detector.on_navigation(1, "https://claude.ai/"));
    }

    #[test]
    fn test_custom_cooldown_window() {
        let clock = Arc::new(ManualClock::utc(0));
        let set = MatchSet::from_patterns(["*://claude.ai/*"]);
        let mut detector =
            Detector::new(set, Arc::clone(&clock)).with_cooldown(5_000);

        assert!(detector.on_navigation(1, "https://claude.ai/"));
        clock.advance(4_999);
        assert!(!detector.on_navigation(1, "https://claude.ai/"));
        clock.advance(1);
        assert!(detector.on_navigation(1, "https://claude.ai/"));
    }
}
