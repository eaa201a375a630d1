use chrono::{DateTime, Duration, Utc};

/// The first whole millisecond strictly after `time`.
///
/// Stored timestamps keep millisecond precision. Stamping with the next tick instead of
/// truncating keeps a stamp later than any instant read before it was taken.
pub fn next_millis(time: DateTime<Utc>) -> DateTime<Utc> {
    let truncated = DateTime::from_timestamp_millis(time.timestamp_millis()).unwrap_or(time);
    truncated + Duration::milliseconds(1)
}
