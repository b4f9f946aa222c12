use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::{invalid_input_error, Error};

const STORAGE_FORMAT: &str = "%Y-%m-%d";

/// A Gregorian calendar day, stored by the backend as `YYYY-MM-DD`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self, Error> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(invalid_input_error)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn to_storage(&self) -> String {
        self.0.format(STORAGE_FORMAT).to_string()
    }

    /// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp, which the backend
    /// returns for date columns.
    pub fn from_storage(text: &str) -> Result<Self, Error> {
        let text = text.trim();

        if let Ok(date) = NaiveDate::parse_from_str(text, STORAGE_FORMAT) {
            return Ok(Self(date));
        }

        let timestamp = DateTime::parse_from_rfc3339(text)?;
        Ok(Self(timestamp.date_naive()))
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_storage())
    }
}

impl Serialize for CalendarDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_storage())
    }
}

impl<'de> Deserialize<'de> for CalendarDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Self::from_storage(&text).map_err(de::Error::custom)
    }
}

/// Optional day field: null, missing or empty decode to `None`.
pub fn optional_day<'de, D>(deserializer: D) -> Result<Option<CalendarDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(Value::String(text)) => CalendarDate::from_storage(&text)
            .map(Some)
            .map_err(de::Error::custom),
        Some(other) => Err(de::Error::custom(format!("expected a date, found {}", other))),
    }
}

#[test]
fn converts_to_and_from_storage() {
    let date = CalendarDate::new(2024, 3, 9).unwrap();

    assert_eq!(date.to_storage(), "2024-03-09");
    assert_eq!(CalendarDate::from_storage("2024-03-09").unwrap(), date);
    assert_eq!(
        CalendarDate::from_storage("2024-03-09T00:00:00.000Z").unwrap(),
        date
    );
    assert_eq!((date.year(), date.month(), date.day()), (2024, 3, 9));
}

#[test]
fn rejects_impossible_days() {
    assert!(CalendarDate::new(2023, 2, 29).is_err());
    assert!(CalendarDate::from_storage("2024-13-01").is_err());
    assert!(CalendarDate::from_storage("yesterday").is_err());
}
