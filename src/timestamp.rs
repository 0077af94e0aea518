// 📅 Timestamps - strict parsing of backend date strings
//
// The backend stores naive ISO-8601 datetimes (`2024-01-08T10:15:00.123456`),
// older records carry `2024-01-08 10:15:00`, and some clients send RFC 3339
// with an offset. Anything else is an error - never a silent default.

use crate::error::ValidationError;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Display format for dates ("8 Jan 2024")
pub const DISPLAY_FORMAT: &str = "%-d %b %Y";

// ============================================================================
// PARSING
// ============================================================================

/// Parse a required timestamp.
///
/// `field` names the input for the error message. RFC 3339 input is
/// converted to local wall time before the offset is dropped.
pub fn parse_timestamp(field: &str, raw: &str) -> Result<NaiveDateTime, ValidationError> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::MissingTimestamp {
            field: field.to_string(),
        });
    }

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(trimmed) {
        // SystemClock reads local time
        return Ok(with_offset.with_timezone(&Local).naive_local());
    }

    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(parsed);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        return Ok(date.and_time(NaiveTime::MIN));
    }

    Err(ValidationError::MalformedTimestamp {
        field: field.to_string(),
        value: raw.to_string(),
    })
}

/// Parse an optional timestamp: `None`/blank is `Ok(None)`, garbage is still an error
pub fn parse_optional_timestamp(
    field: &str,
    raw: Option<&str>,
) -> Result<Option<NaiveDateTime>, ValidationError> {
    match raw {
        Some(value) if !value.trim().is_empty() => parse_timestamp(field, value).map(Some),
        _ => Ok(None),
    }
}

// ============================================================================
// FORMATTING
// ============================================================================

pub fn format_date(timestamp: Option<NaiveDateTime>) -> String {
    match timestamp {
        Some(ts) => ts.format(DISPLAY_FORMAT).to_string(),
        None => "N/A".to_string(),
    }
}

/// Wire format used when handing a timestamp back to the backend
pub fn to_iso(timestamp: NaiveDateTime) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%S").to_string()
}

// ============================================================================
// SERDE HELPERS
// ============================================================================

/// `#[serde(with = ...)]` adapter for optional backend timestamps.
///
/// Deserialisation goes through [`parse_optional_timestamp`], so a malformed
/// string fails the whole record instead of turning into `None`.
pub mod optional {
    use super::{parse_optional_timestamp, to_iso};
    use chrono::NaiveDateTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_some(&to_iso(*ts)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        parse_optional_timestamp("timestamp", raw.as_deref()).map_err(D::Error::custom)
    }
}

/// `#[serde(with = ...)]` adapter for required backend timestamps
pub mod required {
    use super::{parse_timestamp, to_iso};
    use chrono::NaiveDateTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&to_iso(*value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp("timestamp", &raw).map_err(D::Error::custom)
    }
}

// ============================================================================
// TESTS
// ============================================================================
