// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for parsing event timestamps and challenge windows.
//!
//! Workout timestamps are local wall-clock times. Anything carrying a UTC
//! offset is reduced to its wall-clock reading so it compares directly
//! against challenge windows, which are stored without a zone.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a local timestamp string.
///
/// Accepts RFC 3339 (offset dropped), naive `YYYY-MM-DDTHH:MM:SS[.fff]`,
/// and bare `YYYY-MM-DD` (start of day).
pub fn parse_local_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Convert Unix epoch seconds (fractional allowed) to a naive UTC timestamp.
pub fn from_unix_seconds(seconds: f64) -> Option<NaiveDateTime> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1_000_000_000.0).round() as u32;
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999)).map(|dt| dt.naive_utc())
}

/// Parse the inclusive lower bound of a challenge window.
pub fn parse_window_start(value: &str) -> Option<NaiveDateTime> {
    parse_local_timestamp(value)
}

/// Parse the inclusive upper bound of a challenge window.
///
/// A bare date covers the whole day.
pub fn parse_window_end(value: &str) -> Option<NaiveDateTime> {
    if let Ok(date) = NaiveDate::parse_from_str(value.trim(), DATE_FORMAT) {
        return date.and_hms_nano_opt(23, 59, 59, 999_999_999);
    }
    parse_local_timestamp(value)
}
