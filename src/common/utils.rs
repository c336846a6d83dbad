use std::time::Duration;

use chrono::Utc;
use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Wall-clock nanoseconds since UNIX_EPOCH.
pub fn now_nanos() -> i64 {
    // Out of range only after the year 2262.
    Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}

pub fn now_unix_secs() -> i64 {
    Utc::now().timestamp()
}

/// Interval ticker for the recurring tasks. Missed ticks are delayed, not burst.
pub fn periodic(period: Duration, fire_immediately: bool) -> Interval {
    // tokio panics on a zero period
    let period = period.max(Duration::from_millis(1));
    let start = if fire_immediately {
        Instant::now()
    } else {
        Instant::now() + period
    };
    let mut ticker = tokio::time::interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}
