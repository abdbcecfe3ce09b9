//! Minute-boundary arithmetic for the publishing cadence.
//!
//! Each wait is recomputed from the wall clock, so sleep overshoot and cycle
//! processing time never accumulate into drift.

use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};

const MICROS_PER_SECOND: u64 = 1_000_000;
const MICROS_PER_MINUTE: u64 = 60 * MICROS_PER_SECOND;

/// Source of the current UTC time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock backed by `chrono::Utc::now`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Time left until the next `:00` second in UTC.
///
/// Computed as `60 - second - microsecond / 1e6`. Exactly on the boundary
/// the result is a full minute rather than zero, so a cycle that finishes
/// within the same microsecond it started never fires twice.
pub fn delay_until_next_minute(now: DateTime<Utc>) -> Duration {
    // chrono reports leap seconds as nanosecond >= 1e9
    let second = u64::from(now.second().min(59));
    let micros = u64::from(now.nanosecond() / 1_000).min(MICROS_PER_SECOND - 1);

    let elapsed = second * MICROS_PER_SECOND + micros;
    Duration::from_micros(MICROS_PER_MINUTE - elapsed)
}

/// The UTC minute boundary the next cycle will start on.
pub fn next_minute_boundary(now: DateTime<Utc>) -> DateTime<Utc> {
    let delay = delay_until_next_minute(now);
    now + chrono::Duration::microseconds(delay.as_micros() as i64)
}
