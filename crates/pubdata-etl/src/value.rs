//! Raw source values and the lenient conversions applied to them
//!
//! Every source format (JSON documents, CSV text, spreadsheet cells) is first
//! lifted into [`RawValue`]. The `to_*` helpers then turn a raw value into the
//! typed value a column wants, returning `None` for anything null, empty or
//! malformed. They never fail.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// A single untyped value as it appeared in a source record
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl RawValue {
    /// Lift an optional JSON value; a missing field is null
    pub fn from_json(value: Option<&serde_json::Value>) -> Self {
        value.map(RawValue::from).unwrap_or(RawValue::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }
}

impl From<&serde_json::Value> for RawValue {
    fn from(value: &serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => RawValue::Null,
            Value::Bool(b) => RawValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => RawValue::Int(i),
                None => n.as_f64().map(RawValue::Float).unwrap_or(RawValue::Null),
            },
            Value::String(s) => RawValue::Text(s.clone()),
            // Nested structures have no scalar reading
            Value::Array(_) | Value::Object(_) => RawValue::Null,
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<&calamine::Data> for RawValue {
    fn from(cell: &calamine::Data) -> Self {
        use calamine::Data;

        match cell {
            Data::Empty | Data::Error(_) => RawValue::Null,
            Data::Bool(b) => RawValue::Bool(*b),
            Data::Int(i) => RawValue::Int(*i),
            Data::Float(f) => RawValue::Float(*f),
            Data::String(s) => RawValue::Text(s.clone()),
            Data::DateTime(dt) => dt
                .as_datetime()
                .map(RawValue::DateTime)
                .unwrap_or(RawValue::Null),
            Data::DateTimeIso(s) | Data::DurationIso(s) => RawValue::Text(s.clone()),
        }
    }
}

/// Lenient float conversion
pub fn to_float(value: &RawValue) -> Option<f64> {
    let f = match value {
        RawValue::Int(i) => *i as f64,
        RawValue::Float(f) => *f,
        RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    f.is_finite().then_some(f)
}

/// Lenient integer conversion; fractional values truncate toward zero
pub fn to_int(value: &RawValue) -> Option<i64> {
    match value {
        RawValue::Int(i) => Some(*i),
        RawValue::Float(f) => truncate(*f),
        RawValue::Text(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate))
        },
        _ => None,
    }
}

fn truncate(f: f64) -> Option<i64> {
    if !f.is_finite() {
        return None;
    }
    let t = f.trunc();
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    if t < -(2f64.powi(63)) || t >= 2f64.powi(63) {
        return None;
    }
    Some(t as i64)
}

/// Lenient text conversion: trimmed, with empty treated as null
pub fn to_text(value: &RawValue) -> Option<String> {
    match value {
        RawValue::Null => None,
        RawValue::Bool(b) => Some(b.to_string()),
        RawValue::Int(i) => Some(i.to_string()),
        RawValue::Float(f) if !f.is_finite() => None,
        RawValue::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => {
            Some(format!("{}", *f as i64))
        },
        RawValue::Float(f) => Some(f.to_string()),
        RawValue::Text(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        },
        RawValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        RawValue::DateTime(dt) => Some(dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
    }
}

/// Lenient date conversion: dates, the date part of datetimes, ISO text
pub fn to_date(value: &RawValue) -> Option<NaiveDate> {
    match value {
        RawValue::Date(d) => Some(*d),
        RawValue::DateTime(dt) => Some(dt.date()),
        RawValue::Text(s) => {
            let s = s.trim();
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .or_else(|| parse_datetime_text(s).map(|dt| dt.date()))
        },
        _ => None,
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 style datetime without or with an offset.
///
/// Offset-bearing values are converted to UTC before the offset is dropped.
pub fn parse_datetime_text(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Lenient UTC timestamp conversion; naive values are taken to be UTC
pub fn to_timestamp(value: &RawValue) -> Option<DateTime<Utc>> {
    match value {
        RawValue::DateTime(dt) => Some(Utc.from_utc_datetime(dt)),
        RawValue::Date(d) => d.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt)),
        RawValue::Text(s) => parse_datetime_text(s).map(|dt| Utc.from_utc_datetime(&dt)),
        _ => None,
    }
}

/// Milliseconds since the Unix epoch as a UTC timestamp
pub fn epoch_millis_to_utc(value: &RawValue) -> Option<DateTime<Utc>> {
    let ms = to_int(value)?;
    Utc.timestamp_millis_opt(ms).single()
}
