//! Wiring between the detector and the usage counter.
//!
//! The watcher is the background half of the system: it receives raw
//! activity signals, resolves tab URLs, and credits the counter for each
//! accepted detection. Nothing here returns an error to the signal source;
//! persistence failures are swallowed (and logged) inside the counter.

use std::collections::HashMap;

use tracing::debug;

use crate::clock::Clock;
use crate::counter::{UsageCounter, DEFAULT_INCREMENT_ML};
use crate::detector::{ActivitySignal, Detector};
use crate::storage::KeyValueStore;

/// Feeds activity signals through detection into the weekly counter.
///
/// Keeps each tab's last known URL (from navigation signals) so activation
/// signals can be resolved without a browser lookup call; tabs never seen
/// navigating are ignored, and closed tabs are dropped from the registry.
pub struct ActivityWatcher<S, C> {
    detector: Detector<C>,
    counter: UsageCounter<S, C>,
    tab_urls: HashMap<u32, String>,
    increment_ml: u32,
}

impl<S: KeyValueStore, C: Clock> ActivityWatcher<S, C> {
    /// Create a watcher crediting [`DEFAULT_INCREMENT_ML`] per usage event
    pub fn new(detector: Detector<C>, counter: UsageCounter<S, C>) -> Self {
        Self {
            detector,
            counter,
            tab_urls: HashMap::new(),
            increment_ml: DEFAULT_INCREMENT_ML,
        }
    }

    /// Override the per-event increment
    pub fn with_increment(mut self, increment_ml: u32) -> Self {
        self.increment_ml = increment_ml;
        self
    }

    /// Feed one raw signal through detection. An accepted detection credits
    /// the counter exactly once.
    pub async fn handle(&mut self, signal: ActivitySignal) {
        let accepted = match signal {
            ActivitySignal::RequestCompleted { initiator, url } => {
                self.detector.on_request(&initiator, &url)
            }
            ActivitySignal::TabNavigated { tab_id, url } => {
                let hit = self.detector.on_navigation(tab_id, &url);
                self.tab_urls.insert(tab_id, url);
                hit
            }
            ActivitySignal::TabActivated { tab_id } => {
                match self.tab_urls.get(&tab_id).cloned() {
                    Some(url) => self.detector.on_activation(tab_id, &url),
                    // URL unknown, same as an unresolvable tab lookup
                    None => false,
                }
            }
            ActivitySignal::TabClosed { tab_id } => {
                // Keeps the registry bounded by the set of live tabs
                self.tab_urls.remove(&tab_id);
                false
            }
        };

        if accepted {
            let counter = self.counter.increment(self.increment_ml).await;
            debug!(value_ml = counter.value_ml, "usage credited");
        }
    }
}
