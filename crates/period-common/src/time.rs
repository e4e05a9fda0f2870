//! Millisecond time helpers.
//!
//! All period arithmetic is plain `u64` milliseconds since the Unix epoch.
//! These helpers convert between that representation, `std::time` values,
//! and the RFC 3339 text accepted on the command line.

use crate::error::{PeriodError, PeriodResult};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Nanoseconds in one millisecond.
pub const NANOS_PER_MILLI: u64 = 1_000_000;

/// Span reported before a registry is configured.
pub const DEFAULT_SPAN_MILLIS: u64 = 10_000;

/// Last millisecond RFC 3339 can express: 9999-12-31T23:59:59.999Z.
pub const MAX_RFC3339_MILLIS: u64 = 253_402_300_799_999;

/// Convert a configured span into a [`Duration`].
///
/// The span is scaled by [`NANOS_PER_MILLI`] and read as nanoseconds, so the
/// resulting duration is exactly `span` milliseconds long. `from_millis` gives
/// the same nanosecond count as `span * 1_000_000` without overflowing.
#[must_use]
pub fn span_duration(span: u64) -> Duration {
    Duration::from_millis(span)
}

/// Milliseconds since the Unix epoch for `time`. Instants before the epoch map to 0.
#[must_use]
pub fn system_time_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Local wall-clock milliseconds since the Unix epoch.
#[must_use]
pub fn unix_now_millis() -> u64 {
    system_time_millis(SystemTime::now())
}

/// Parse a timestamp given either as integer milliseconds or as RFC 3339 text.
///
/// # Errors
///
/// Returns [`PeriodError::InvalidTimestamp`] if the input is neither, or if the
/// RFC 3339 instant precedes the Unix epoch.
pub fn parse_timestamp(input: &str) -> PeriodResult<u64> {
    let input = input.trim();
    if let Ok(millis) = input.parse::<u64>() {
        return Ok(millis);
    }

    let time = humantime::parse_rfc3339_weak(input).map_err(|e| {
        PeriodError::invalid_timestamp(format!("cannot parse {input:?} as a timestamp: {e}"))
    })?;

    if time < UNIX_EPOCH {
        return Err(PeriodError::invalid_timestamp(format!(
            "{input:?} is before the Unix epoch"
        )));
    }
    Ok(system_time_millis(time))
}

/// Format epoch milliseconds as RFC 3339 with millisecond precision (UTC).
///
/// Returns `None` past [`MAX_RFC3339_MILLIS`], where four-digit years end.
#[must_use]
pub fn format_timestamp(millis: u64) -> Option<String> {
    if millis > MAX_RFC3339_MILLIS {
        return None;
    }
    let time = UNIX_EPOCH + Duration::from_millis(millis);
    Some(humantime::format_rfc3339_millis(time).to_string())
}
