//! The `run` command: consume an activity feed and accumulate usage.

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use waterwatch_core::{
    ActivitySignal, ActivityWatcher, Detector, FileStore, Gauge, KeyValueStore, MatchSet,
    SystemClock, UsageCounter, KEY_VALUE_ML,
};

use crate::config::Settings;

/// Read newline-delimited activity signals from stdin until EOF, crediting
/// the weekly counter for each accepted detection.
pub async fn run(settings: &Settings) -> Result<()> {
    let store = FileStore::new(&settings.state_path);
    let matches = MatchSet::from_patterns(&settings.watch.match_patterns);
    info!(
        patterns = matches.len(),
        state = %settings.state_path.display(),
        "watching activity feed on stdin"
    );

    let detector =
        Detector::new(matches, SystemClock).with_cooldown(settings.watch.cooldown_ms);
    let counter = UsageCounter::new(store.clone(), SystemClock);
    let mut watcher =
        ActivityWatcher::new(detector, counter).with_increment(settings.watch.increment_ml);

    spawn_gauge_logger(store.clone());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<ActivitySignal>(line) {
            Ok(signal) => watcher.handle(signal).await,
            Err(err) => warn!("ignoring malformed signal: {err}"),
        }
    }

    info!("activity feed closed");
    Ok(())
}

/// Log the gauge whenever the counter value changes in the store.
fn spawn_gauge_logger(store: FileStore) {
    let mut changes = store.subscribe();
    tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(change) if change.keys.iter().any(|k| k == KEY_VALUE_ML) => {
                    let counter = UsageCounter::new(store.clone(), SystemClock).read().await;
                    info!("water gauge: {}", Gauge::weekly(counter.value_ml).summary());
                }
                Ok(_) => {}
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });
}
