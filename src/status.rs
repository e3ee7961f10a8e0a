//! The `status` command: print the current weekly counter and gauge.

use anyhow::Result;
use chrono::{Local, TimeZone};

use waterwatch_core::{FileStore, Gauge, SystemClock, UsageCounter, CAPACITY_ML};

use crate::config::Settings;

pub async fn run(settings: &Settings) -> Result<()> {
    let store = FileStore::new(&settings.state_path);
    let counter = UsageCounter::new(store, SystemClock).read().await;

    let week_start = Local
        .timestamp_millis_opt(counter.week_start_ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown".to_string());

    println!("Week starting {week_start}");
    println!("{} ml / {} ml", counter.value_ml, CAPACITY_ML);
    println!("{}", Gauge::weekly(counter.value_ml).summary());
    Ok(())
}
