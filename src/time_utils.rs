// SPDX-License-Identifier: MIT

//! Shared helpers for date/time formatting.

use chrono::{DateTime, SecondsFormat, Utc};

/// Current time as RFC3339 with a `Z` suffix.
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a stored timestamp, tolerating the formats that have shown up in
/// activity records over time. Returns None for anything unrecognized.
pub fn parse_stored_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    // Unix seconds stored as a bare number
    if let Ok(secs) = raw.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rfc3339() {
        let dt = parse_stored_timestamp("2026-08-01T10:30:00Z").unwrap();
        assert_eq!(dt.to_rfc3339_opts(SecondsFormat::Secs, true), "2026-08-01T10:30:00Z");
    }

    #[test]
    fn test_parse_naive_datetime() {
        assert!(parse_stored_timestamp("2026-08-01 10:30:00").is_some());
    }

    #[test]
    fn test_parse_unix_seconds() {
        let dt = parse_stored_timestamp("1754042400").unwrap();
        assert_eq!(dt.timestamp(), 1_754_042_400);
    }

    #[test]
    fn test_parse_garbage_is_none() {
        assert!(parse_stored_timestamp("not-a-date").is_none());
        assert!(parse_stored_timestamp("").is_none());
    }
}
