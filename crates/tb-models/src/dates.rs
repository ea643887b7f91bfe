//! Lenient timestamp parsing for end dates
//!
//! End dates arrive as text and are not guaranteed to be well formed.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parse an end date; `None` for anything unrecognised
///
/// Accepts RFC 3339, Postgres `timestamptz` text, naive date-times (read as
/// UTC) and plain dates (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_plain_date() {
        let dt = parse_timestamp("2024-01-01").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 1, 1));
        assert_eq!(dt.hour(), 0);
    }

    #[test]
    fn test_rfc3339_with_offset() {
        let dt = parse_timestamp("2024-03-10T12:00:00+02:00").unwrap();
        assert_eq!(dt.hour(), 10);
    }

    #[test]
    fn test_postgres_text() {
        let dt = parse_timestamp("2024-03-10 08:30:00+00").unwrap();
        assert_eq!((dt.hour(), dt.minute()), (8, 30));
    }

    #[test]
    fn test_naive_datetime() {
        assert!(parse_timestamp("2024-03-10T08:30:00").is_some());
        assert!(parse_timestamp("2024-03-10T08:30").is_some());
    }

    #[test]
    fn test_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("next tuesday").is_none());
        assert!(parse_timestamp("2024-13-45").is_none());
    }
}
