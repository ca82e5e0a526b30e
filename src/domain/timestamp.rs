//! Lenient timestamp decoding for backend records.
//!
//! The backend emits RFC 3339 strings, offset-less local datetimes
//! (`2024-05-01T10:20:30.123456`, `T` or space separated) or component
//! arrays (`[2024, 5, 1, 10, 20, 30]`). Offset-less values are read as UTC.
//! Any other JSON value decodes as absent rather than failing the
//! surrounding record.

use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};

/// Whether a raw wire timestamp is set at all, parseable or not. Only
/// `null` and the empty string count as unset.
pub fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(text) => !text.is_empty(),
        _ => true,
    }
}

pub fn from_value(value: &Value) -> Option<OffsetDateTime> {
    match value {
        Value::String(text) => parse(text),
        Value::Array(parts) => from_components(parts),
        _ => None,
    }
}

fn from_components(parts: &[Value]) -> Option<OffsetDateTime> {
    let mut numbers = parts.iter().map(Value::as_i64);
    let mut next = || numbers.next().flatten();
    let year = i32::try_from(next()?).ok()?;
    let month = Month::try_from(u8::try_from(next()?).ok()?).ok()?;
    let day = u8::try_from(next()?).ok()?;
    let hour = u8::try_from(next().unwrap_or(0)).ok()?;
    let minute = u8::try_from(next().unwrap_or(0)).ok()?;
    let second = u8::try_from(next().unwrap_or(0)).ok()?;
    let nanos = u32::try_from(next().unwrap_or(0)).ok()?;

    let date = Date::from_calendar_date(year, month, day).ok()?;
    let time = Time::from_hms_nano(hour, minute, second, nanos).ok()?;
    Some(PrimitiveDateTime::new(date, time).assume_utc())
}

pub fn parse(value: &str) -> Option<OffsetDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(parsed) = OffsetDateTime::parse(value, &Rfc3339) {
        return Some(parsed);
    }

    let with_fraction = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");
    let without_fraction = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    let short = format_description!("[year]-[month]-[day]T[hour]:[minute]");

    // Some serializers use a space instead of `T`.
    let normalized = value.replacen(' ', "T", 1);
    let value = normalized.as_str();
    PrimitiveDateTime::parse(value, with_fraction)
        .or_else(|_| PrimitiveDateTime::parse(value, without_fraction))
        .or_else(|_| PrimitiveDateTime::parse(value, short))
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

/// `#[serde(with = "timestamp::option")]` adapter for `Option<OffsetDateTime>`.
/// Decoding accepts any JSON value and never fails.
pub mod option {
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;
    use time::format_description::well_known::Rfc3339;
    use time::OffsetDateTime;

    pub fn serialize<S>(value: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => {
                let formatted = value.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
                serializer.serialize_some(&formatted)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(raw.as_ref().and_then(super::from_value))
    }
}
