//! Lenient decoders for numbers the backend may hand back as strings
//! (decimal columns) or leave null.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

pub(crate) fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

/// Number or numeric string. Anything else is an error.
pub fn f64_strict<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;

    value_to_f64(&value)
        .ok_or_else(|| de::Error::custom(format!("expected a number, found {}", value)))
}

/// Number or numeric string; null, empty or missing decode to zero.
pub fn f64_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;

    match value {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(0.0),
        Some(value) => value_to_f64(&value)
            .ok_or_else(|| de::Error::custom(format!("expected a number, found {}", value))),
    }
}

/// Number or numeric string; null, empty or missing decode to `None`.
pub fn optional_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;

    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(value) => value_to_f64(&value)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("expected a number, found {}", value))),
    }
}

/// String, number or null; null decodes to an empty string.
pub fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;

    match value {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(other) => Err(de::Error::custom(format!(
            "expected a string, found {}",
            other
        ))),
    }
}

#[test]
fn decodes_numbers_and_numeric_strings() {
    #[derive(Deserialize)]
    struct Row {
        #[serde(deserialize_with = "f64_strict")]
        rate: f64,
        #[serde(default, deserialize_with = "f64_or_zero")]
        distance: f64,
        #[serde(default, deserialize_with = "optional_f64")]
        weight: Option<f64>,
        #[serde(default, deserialize_with = "string_or_empty")]
        code: String,
    }

    let row: Row = serde_json::from_str(
        r#"{"rate": "5000.00", "distance": null, "weight": "", "code": 42}"#,
    )
    .unwrap();
    assert_eq!(row.rate, 5000.0);
    assert_eq!(row.distance, 0.0);
    assert_eq!(row.weight, None);
    assert_eq!(row.code, "42");

    let row: Row = serde_json::from_str(r#"{"rate": 12.5, "weight": 80}"#).unwrap();
    assert_eq!(row.rate, 12.5);
    assert_eq!(row.distance, 0.0);
    assert_eq!(row.weight, Some(80.0));
    assert_eq!(row.code, "");

    assert!(serde_json::from_str::<Row>(r#"{"rate": "abc"}"#).is_err());
}
