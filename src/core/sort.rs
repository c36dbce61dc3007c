//! Chronological ordering of merged records.

use std::cmp::Reverse;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::record::SanitizedRecord;

/// Naive layouts tried after RFC 3339 and RFC 2822, interpreted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a timestamp string into UTC.
///
/// Accepts RFC 3339, RFC 2822, `YYYY-MM-DD[T ]HH:MM:SS[.fff]` without an
/// offset, and bare `YYYY-MM-DD` dates (midnight). Anything else is `None`.
///
/// ```
/// use tootpack::core::sort::parse_timestamp;
///
/// assert!(parse_timestamp("2024-01-01T10:00:00.000Z").is_some());
/// assert!(parse_timestamp("2024-01-01").is_some());
/// assert!(parse_timestamp("yesterday").is_none());
/// ```
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Reads and parses the timestamp field of a record.
pub fn record_timestamp(record: &SanitizedRecord, field: &str) -> Option<DateTime<Utc>> {
    record.get_str(field).and_then(parse_timestamp)
}

/// Sorts records most recent first.
///
/// The sort is stable: equal timestamps keep their input order. Records
/// whose timestamp is missing, not a string or unparsable go to the end,
/// also in input order.
pub fn sort_by_timestamp(mut records: Vec<SanitizedRecord>, field: &str) -> Vec<SanitizedRecord> {
    // `None < Some(_)`, so reversing puts unparsable timestamps last.
    records.sort_by_cached_key(|record| Reverse(record_timestamp(record, field)));
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RichTextKeys;
    use crate::core::normalize::normalize;
    use crate::record::RawRecord;
    use chrono::TimeZone;
    use serde_json::{Value, json};

    fn record(value: Value) -> SanitizedRecord {
        normalize(RawRecord::from_value(value).unwrap(), &RichTextKeys::default())
    }

    fn ids(records: &[SanitizedRecord]) -> Vec<&str> {
        records.iter().map(|r| r.get_str("id").unwrap()).collect()
    }

    #[test]
    fn test_parse_rfc3339_variants() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-01T10:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01T12:00:00+02:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-01-01T10:00:00.250Z").map(|d| d.timestamp_subsec_millis()),
            Some(250)
        );
    }

    #[test]
    fn test_parse_rfc2822() {
        assert_eq!(
            parse_timestamp("Mon, 01 Jan 2024 10:00:00 +0000"),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_naive_forms_as_utc() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 8, 9, 10).unwrap();
        assert_eq!(parse_timestamp("2024-03-05T08:09:10"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05 08:09:10"), Some(expected));
        assert!(parse_timestamp("2024-03-05 08:09:10.5").is_some());
        assert_eq!(
            parse_timestamp(" 2024-03-05 "),
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for raw in ["", "   ", "not a date", "2024-13-01", "2024-02-30", "1700000000"] {
            assert_eq!(parse_timestamp(raw), None, "accepted {raw:?}");
        }
    }

    #[test]
    fn test_sort_descending() {
        let records = vec![
            record(json!({"id": "old", "created_at": "2023-01-01T00:00:00Z"})),
            record(json!({"id": "new", "created_at": "2024-06-01T00:00:00Z"})),
            record(json!({"id": "mid", "created_at": "2024-01-01"})),
        ];
        assert_eq!(ids(&sort_by_timestamp(records, "created_at")), vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let records = vec![
            record(json!({"id": "a", "created_at": "2024-01-01T00:00:00Z"})),
            record(json!({"id": "b", "created_at": "2024-01-01T00:00:00+00:00"})),
            record(json!({"id": "c", "created_at": "2024-01-01"})),
        ];
        assert_eq!(ids(&sort_by_timestamp(records, "created_at")), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unparsable_timestamps_go_last_in_input_order() {
        let records = vec![
            record(json!({"id": "bad1", "created_at": "garbage"})),
            record(json!({"id": "x", "created_at": "2024-01-01"})),
            record(json!({"id": "none"})),
            record(json!({"id": "num", "created_at": 1_700_000_000})),
            record(json!({"id": "y", "created_at": "2024-02-01"})),
        ];
        assert_eq!(
            ids(&sort_by_timestamp(records, "created_at")),
            vec!["y", "x", "bad1", "none", "num"]
        );
    }

    #[test]
    fn test_custom_field() {
        let records = vec![
            record(json!({"id": "1", "published": "2020-01-01"})),
            record(json!({"id": "2", "published": "2021-01-01"})),
        ];
        assert_eq!(ids(&sort_by_timestamp(records, "published")), vec!["2", "1"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(sort_by_timestamp(Vec::new(), "created_at").is_empty());
    }
}
