//! Time and timestamp helpers.

use chrono::{DateTime, Duration, NaiveTime, Utc};

/// UTC timestamp used for creation times, schedules, due dates and expiries.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Midnight (UTC) of the day containing `ts`.
#[must_use]
pub fn start_of_day(ts: Timestamp) -> Timestamp {
    ts.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Half-open `[start, end)` range covering the UTC day containing `ts`.
#[must_use]
pub fn day_bounds(ts: Timestamp) -> (Timestamp, Timestamp) {
    let start = start_of_day(ts);
    (start, start + Duration::days(1))
}
