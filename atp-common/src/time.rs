//! Timestamp utilities
//!
//! The primary store keeps native chrono types. Anything leaving for the
//! document mirror goes through [`iso_value`] so temporal fields arrive as
//! ISO-8601 strings and missing values as an explicit `null`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Today's date in UTC
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Temporal values with an ISO-8601 text form
pub trait IsoFormat {
    fn iso_format(&self) -> String;
}

impl IsoFormat for NaiveDate {
    fn iso_format(&self) -> String {
        self.format("%Y-%m-%d").to_string()
    }
}

impl IsoFormat for NaiveDateTime {
    fn iso_format(&self) -> String {
        self.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
    }
}

impl IsoFormat for DateTime<Utc> {
    fn iso_format(&self) -> String {
        // Offset written as +00:00, sub-second digits only when present
        self.to_rfc3339_opts(SecondsFormat::AutoSi, false)
    }
}

/// Mirror representation of an optional temporal field
pub fn iso_value<T: IsoFormat>(value: Option<&T>) -> Value {
    match value {
        Some(v) => Value::String(v.iso_format()),
        None => Value::Null,
    }
}
