//! Serde helpers for record timestamps.
//!
//! Dates are accepted either as RFC 3339 timestamps or as bare `YYYY-MM-DD` calendar dates
//! (taken as midnight UTC), and are always written as RFC 3339 with millisecond precision
//! and a `Z` suffix, e.g. `2025-08-30T00:00:00.000Z`.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Parse a timestamp or calendar date into a UTC timestamp.
///
/// # Errors
///
/// Returns a description of the rejected input when neither format matches.
pub fn parse_flexible(input: &str) -> Result<DateTime<Utc>, String> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(format!(
        "invalid date '{input}': expected RFC 3339 timestamp or YYYY-MM-DD"
    ))
}

/// Render a timestamp in the wire format.
pub fn format(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `#[serde(with = "crate::dates::required")]` for `DateTime<Utc>` fields.
pub mod required {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_flexible(&raw).map_err(serde::de::Error::custom)
    }
}

/// `#[serde(with = "crate::dates::optional")]` for `Option<DateTime<Utc>>` fields.
///
/// `null` and blank strings both read as `None`.
pub mod optional {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_some(&super::format(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.trim().is_empty() => super::parse_flexible(&raw)
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}
