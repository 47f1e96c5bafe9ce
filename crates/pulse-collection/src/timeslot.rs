//! Wall-clock slot alignment for collection ticks
//!
//! Repeated fixed sleeps drift: each tick's processing time pushes the
//! next one later. Instead the collection task aligns every tick to the
//! next whole multiple of the collection interval on the wall clock, so
//! samples land on stable boundaries regardless of how long a tick took.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// The next slot boundary strictly after `now`.
pub(crate) fn next_slot(now: DateTime<Utc>, interval: Duration) -> DateTime<Utc> {
    let interval_ms = interval.as_millis().max(1) as i64;
    let now_ms = now.timestamp_millis();

    let next_ms = (now_ms.div_euclid(interval_ms) + 1) * interval_ms;

    DateTime::<Utc>::from_timestamp_millis(next_ms).unwrap_or(now)
}

/// Time from `now` until the next slot boundary.
pub(crate) fn time_until_slot(now: DateTime<Utc>, interval: Duration) -> Duration {
    let next = next_slot(now, interval);
    (next - now).to_std().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
#[path = "timeslot_test.rs"]
mod tests;
