//! Timestamp canonicalization.
//!
//! Trade timestamps arrive in several shapes (naive datetimes, UTC
//! datetimes, ISO strings from upstream feeds). They are normalized to
//! `NaiveDateTime` once, at the data-model boundary, and every persisted
//! representation is an ISO-8601 string.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimestampError {
    #[error("unrecognized timestamp string '{0}'")]
    Unparseable(String),
}

/// A timestamp as received from a caller, before canonicalization.
#[derive(Debug, Clone)]
pub enum RawTimestamp {
    DateTime(NaiveDateTime),
    Utc(DateTime<Utc>),
    Iso(String),
}

impl From<NaiveDateTime> for RawTimestamp {
    fn from(value: NaiveDateTime) -> Self {
        RawTimestamp::DateTime(value)
    }
}

impl From<DateTime<Utc>> for RawTimestamp {
    fn from(value: DateTime<Utc>) -> Self {
        RawTimestamp::Utc(value)
    }
}

impl From<&str> for RawTimestamp {
    fn from(value: &str) -> Self {
        RawTimestamp::Iso(value.to_string())
    }
}

impl From<String> for RawTimestamp {
    fn from(value: String) -> Self {
        RawTimestamp::Iso(value)
    }
}

/// Accepted string layouts, tried in order.
const FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Normalize any accepted timestamp representation to a `NaiveDateTime`.
///
/// Date-only strings resolve to midnight. RFC 3339 strings with an offset
/// are converted to their UTC instant.
pub fn canonicalize(raw: RawTimestamp) -> Result<NaiveDateTime, TimestampError> {
    match raw {
        RawTimestamp::DateTime(dt) => Ok(dt),
        RawTimestamp::Utc(dt) => Ok(dt.naive_utc()),
        RawTimestamp::Iso(s) => parse_iso(&s),
    }
}

fn parse_iso(s: &str) -> Result<NaiveDateTime, TimestampError> {
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_hms_opt(0, 0, 0).expect("midnight is valid"));
    }
    Err(TimestampError::Unparseable(s.to_string()))
}

/// Render a canonical timestamp as the ISO-8601 string used for persistence.
pub fn to_iso(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn expected() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, 5)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[test]
    fn canonicalize_naive_datetime() {
        let dt = canonicalize(RawTimestamp::from(expected())).unwrap();
        assert_eq!(dt, expected());
    }

    #[test]
    fn canonicalize_utc_datetime() {
        let utc = Utc.with_ymd_and_hms(2023, 1, 5, 10, 0, 0).unwrap();
        let dt = canonicalize(RawTimestamp::from(utc)).unwrap();
        assert_eq!(dt, expected());
    }

    #[test]
    fn canonicalize_iso_strings() {
        for s in [
            "2023-01-05T10:00:00",
            "2023-01-05 10:00:00",
            "2023-01-05T10:00:00.000",
            "2023-01-05T10:00:00Z",
            "2023-01-05T10:00:00+00:00",
        ] {
            let dt = canonicalize(RawTimestamp::from(s)).unwrap();
            assert_eq!(dt, expected(), "input {s}");
        }
    }

    #[test]
    fn canonicalize_date_only_is_midnight() {
        let dt = canonicalize(RawTimestamp::from("2023-01-05")).unwrap();
        assert_eq!(
            dt,
            NaiveDate::from_ymd_opt(2023, 1, 5)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn canonicalize_rejects_garbage() {
        assert!(canonicalize(RawTimestamp::from("not a timestamp")).is_err());
    }

    #[test]
    fn to_iso_format() {
        assert_eq!(to_iso(&expected()), "2023-01-05T10:00:00");
    }
}
