//! Timestamp helpers for the database layer.
//!
//! Timestamps live in SQLite as `INTEGER` Unix epoch milliseconds (UTC).

use chrono::{DateTime, TimeZone, Utc};

/// Current time as Unix epoch milliseconds (UTC).
#[inline]
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert a `DateTime<Utc>` to Unix epoch milliseconds.
#[inline]
pub fn datetime_to_ms(dt: DateTime<Utc>) -> i64 {
    dt.timestamp_millis()
}

/// Convert Unix epoch milliseconds to `DateTime<Utc>`.
///
/// Out-of-range values fall back to the current time instead of panicking;
/// they can only come from a hand-edited database.
#[inline]
pub fn ms_to_datetime(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let now = ms_to_datetime(now_ms());
        assert_eq!(datetime_to_ms(now), now.timestamp_millis());

        let ms = 1_709_925_600_000; // 2024-03-08T19:20:00Z
        assert_eq!(datetime_to_ms(ms_to_datetime(ms)), ms);
    }
}
