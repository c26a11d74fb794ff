//! Date parsing for temporal column detection.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

// Cheap shape check before trying the chrono formats.
static DATE_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,4}[-/]\d{1,2}[-/]\d{1,4}").unwrap());

/// Timestamp formats, tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

/// Date-only formats. Day-first is tried before month-first.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y"];

/// Parse a date or timestamp.
///
/// Accepts ISO dates and datetimes (with optional fraction and UTC offset,
/// as in NF-e `dhEmi`), `YYYY/MM/DD`, `DD/MM/YYYY`, `MM/DD/YYYY` and
/// `DD-MM-YYYY`, optionally followed by a time. Offsets are dropped and the
/// local wall-clock time kept.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if !DATE_SHAPE.is_match(trimmed) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date.and_time(chrono::NaiveTime::MIN));
        }
    }

    None
}

/// Proleptic Gregorian day number, with 0001-01-01 as day 1.
pub fn day_ordinal(value: &NaiveDateTime) -> i64 {
    use chrono::Datelike;
    value.date().num_days_from_ce() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iso_and_brazilian() {
        let iso = parse_datetime("2024-03-05").unwrap();
        let br = parse_datetime("05/03/2024").unwrap();
        assert_eq!(iso, br);
    }

    #[test]
    fn test_parse_month_first_fallback() {
        let dt = parse_datetime("12/31/2023").unwrap();
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }

    #[test]
    fn test_parse_nfe_timestamp_with_offset() {
        let dt = parse_datetime("2023-07-14T10:32:05-03:00").unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M").to_string(), "2023-07-14 10:32");
    }

    #[test]
    fn test_rejects_non_dates() {
        assert!(parse_datetime("5102").is_none());
        assert!(parse_datetime("ACME LTDA").is_none());
        assert!(parse_datetime("2023-13-45").is_none());
    }

    #[test]
    fn test_day_ordinal() {
        let a = parse_datetime("2024-01-01").unwrap();
        let b = parse_datetime("2024-01-31").unwrap();
        assert_eq!(day_ordinal(&b) - day_ordinal(&a), 30);
        assert_eq!(day_ordinal(&parse_datetime("0001-01-01").unwrap()), 1);
    }
}
