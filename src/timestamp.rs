//! Strict ISO-8601-with-timezone timestamp codec (spec §4.B).
//!
//! This module is the only place in the system that converts strings to times. It accepts only
//! strings carrying an explicit timezone designator (`Z` or `±HH:MM`); anything else — a bare
//! date, a timestamp with no zone, a non-string — is rejected with `InvalidTimestamp`.

use crate::error::MoniflowError;
use chrono::{DateTime, SecondsFormat, Utc};

/// Parse a strict ISO-8601 string (with explicit timezone) into UTC integer seconds.
///
/// Microseconds are accepted and truncated to whole seconds.
pub fn parse(ts: &str) -> Result<i64, MoniflowError> {
    let trimmed = ts.trim();
    if trimmed.is_empty() {
        return Err(MoniflowError::InvalidTimestamp(
            "timestamp must be a non-empty string".to_string(),
        ));
    }

    // `DateTime::parse_from_rfc3339` already requires an explicit offset (it rejects naive
    // datetimes), which gives us the "explicit timezone or reject" rule directly.
    match DateTime::parse_from_rfc3339(trimmed) {
        Ok(dt) => Ok(dt.with_timezone(&Utc).timestamp()),
        Err(_) => Err(MoniflowError::InvalidTimestamp(format!(
            "invalid timestamp format: {ts}"
        ))),
    }
}

/// Current wall-clock time, UTC, formatted with an explicit `Z` designator.
pub fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current wall-clock time as UTC integer seconds.
pub fn now_seconds() -> i64 {
    Utc::now().timestamp()
}
