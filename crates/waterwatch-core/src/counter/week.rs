//! Week-boundary math. Weeks start Monday 00:00 in the caller's UTC offset;
//! Sunday is day 7 of the previous week, not day 0 of a new one.

use chrono::{Datelike, Duration, FixedOffset, LocalResult, TimeZone};

/// Milliseconds in one full week
pub const WEEK_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Map a timestamp to the Monday 00:00 boundary at or before it, in the
/// given UTC offset. Returns epoch (0) for timestamps chrono cannot
/// represent, which downstream staleness checks treat as "never set".
pub fn week_start_ms(now_ms: i64, offset: FixedOffset) -> i64 {
    let local = match offset.timestamp_millis_opt(now_ms) {
        LocalResult::Single(dt) => dt,
        _ => return 0,
    };
    let days_back = local.weekday().num_days_from_monday() as i64;
    let monday = local.date_naive() - Duration::days(days_back);
    let midnight = match monday.and_hms_opt(0, 0, 0) {
        Some(dt) => dt,
        None => return 0,
    };
    match midnight.and_local_timezone(offset) {
        LocalResult::Single(dt) => dt.timestamp_millis(),
        _ => 0,
    }
}
