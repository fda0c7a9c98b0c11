//! Elapsed-time helpers. All durations in this crate are fractional hours.

use chrono::{DateTime, TimeDelta, Utc};
use crate::Time;

/// Errors produced while computing durations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DurationError {
    /// Timestamp is not valid RFC 3339
    #[error("invalid date '{value}': {reason}")]
    InvalidDate {
        /// Offending input
        value: String,
        /// Parser message
        reason: String,
    },
}

/// Hours elapsed between two RFC 3339 timestamps.
///
/// Fractional hours are preserved and the result is negative when `end`
/// precedes `start`.
pub fn calculate_duration(start_iso: &str, end_iso: &str) -> Result<f64, DurationError> {
    let start = parse_time(start_iso)?;
    let end = parse_time(end_iso)?;
    Ok(hours_between(start, end))
}

/// Hours elapsed between two timestamps.
pub fn hours_between(start: Time, end: Time) -> f64 {
    (end - start).num_milliseconds() as f64 / 3_600_000.0
}

/// Convert fractional hours to a chrono duration, at millisecond precision.
///
/// `None` when `hours` is not finite or does not fit a `TimeDelta`.
pub fn hours_to_duration(hours: f64) -> Option<TimeDelta> {
    if !hours.is_finite() {
        return None;
    }
    let millis = (hours * 3_600_000.0).round();
    if millis.abs() >= i64::MAX as f64 {
        return None;
    }
    TimeDelta::try_milliseconds(millis as i64)
}

/// `time` plus `hours`, `None` on overflow.
pub fn checked_add_hours(time: Time, hours: f64) -> Option<Time> {
    time.checked_add_signed(hours_to_duration(hours)?)
}

/// `time` plus `hours`, clamped to the representable range.
pub fn saturating_add_hours(time: Time, hours: f64) -> Time {
    checked_add_hours(time, hours).unwrap_or(if hours < 0.0 {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

/// Parse an RFC 3339 timestamp into UTC.
pub fn parse_time(value: &str) -> Result<Time, DurationError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DurationError::InvalidDate {
            value: value.to_string(),
            reason: e.to_string(),
        })
}
