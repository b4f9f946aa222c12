use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::numeric::{f64_strict, string_or_empty};
use crate::entities::Coordinates;
use crate::error::{invalid_input_error, Error};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    #[serde(deserialize_with = "f64_strict")]
    pub lat: f64,
    #[serde(deserialize_with = "f64_strict")]
    pub lng: f64,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub title: String,
}

impl Destination {
    pub fn new(coordinates: Coordinates, title: String) -> Self {
        Self {
            lat: coordinates.lat,
            lng: coordinates.lng,
            title,
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// Ordered destinations of one mission. Insertion order is the visit
/// order; nothing here reorders or deduplicates.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Destinations(Vec<Destination>);

impl Destinations {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn add(&mut self, destination: Destination) -> &[Destination] {
        self.0.push(destination);
        &self.0
    }

    pub fn remove_at(&mut self, index: usize) -> Result<Destination, Error> {
        if index >= self.0.len() {
            return Err(invalid_input_error());
        }

        Ok(self.0.remove(index))
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn as_slice(&self) -> &[Destination] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&Destination> {
        self.0.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Destination> {
        self.0.iter()
    }

    pub fn coordinates(&self) -> Vec<Coordinates> {
        self.0.iter().map(Destination::coordinates).collect()
    }

    /// Decodes destinations as stored by the backend: a JSON-encoded
    /// string or a plain value, either an array or a single object.
    /// Malformed content decodes to an empty list.
    pub fn decode(value: &Value) -> Self {
        match value {
            Value::Null => Self::new(),
            Value::String(text) if text.trim().is_empty() => Self::new(),
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(inner) => Self::decode_items(inner),
                Err(err) => {
                    tracing::warn!(error = %err, "stored destinations are not valid JSON");
                    Self::new()
                }
            },
            other => Self::decode_items(other.clone()),
        }
    }

    fn decode_items(value: Value) -> Self {
        let items = match value {
            Value::Array(items) => items,
            Value::Object(_) => vec![value],
            Value::Null => return Self::new(),
            other => {
                tracing::warn!(value = %other, "stored destinations have an unexpected shape");
                return Self::new();
            }
        };

        match serde_json::from_value::<Vec<Destination>>(Value::Array(items)) {
            Ok(destinations) => {
                if let Some(invalid) = destinations.iter().find(|d| !d.coordinates().is_valid()) {
                    tracing::warn!(
                        lat = invalid.lat,
                        lng = invalid.lng,
                        "stored destination is out of range"
                    );
                    return Self::new();
                }

                Self(destinations)
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to decode stored destinations");
                Self::new()
            }
        }
    }
}

impl From<Vec<Destination>> for Destinations {
    fn from(destinations: Vec<Destination>) -> Self {
        Self(destinations)
    }
}

/// Serde adapter for the backend's string-encoded destinations field.
pub mod encoded {
    use serde::{de::Deserializer, ser, Deserialize, Serializer};
    use serde_json::Value;

    use super::Destinations;

    pub fn serialize<S>(destinations: &Destinations, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let text = serde_json::to_string(destinations.as_slice()).map_err(ser::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Destinations, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;

        Ok(value
            .map(|value| Destinations::decode(&value))
            .unwrap_or_default())
    }
}

#[cfg(test)]
fn sample() -> Destinations {
    vec![
        Destination::new(Coordinates { lat: 31.36, lng: 48.73 }, "Ahvaz".into()),
        Destination::new(Coordinates { lat: 30.43, lng: 48.18 }, "Abadan".into()),
        Destination::new(Coordinates { lat: 32.38, lng: 48.40 }, "Dezful".into()),
    ]
    .into()
}

#[test]
fn remove_at_preserves_relative_order() {
    let mut destinations = sample();

    let removed = destinations.remove_at(1).unwrap();

    assert_eq!(removed.title, "Abadan");
    let titles: Vec<&str> = destinations.iter().map(|d| d.title.as_str()).collect();
    assert_eq!(titles, vec!["Ahvaz", "Dezful"]);

    destinations.remove_at(1).unwrap();
    destinations.remove_at(0).unwrap();
    assert!(destinations.is_empty());
}

#[test]
fn remove_at_out_of_range_is_rejected() {
    let mut destinations = sample();

    assert_eq!(destinations.remove_at(3).unwrap_err(), invalid_input_error());
    assert_eq!(destinations, sample());
}

#[test]
fn add_then_remove_restores_sequence() {
    let mut destinations = sample();
    let original = destinations.clone();

    let added = destinations.add(Destination::new(
        Coordinates { lat: 31.36, lng: 48.73 },
        "Ahvaz".into(),
    ));
    assert_eq!(added.len(), 4);

    let index = destinations.len() - 1;
    destinations.remove_at(index).unwrap();

    assert_eq!(destinations, original);
}

#[test]
fn add_keeps_duplicates() {
    let mut destinations = Destinations::new();
    let point = Coordinates { lat: 31.36, lng: 48.73 };

    destinations.add(Destination::new(point, "".into()));
    destinations.add(Destination::new(point, "".into()));

    assert_eq!(destinations.len(), 2);
    assert_eq!(destinations.coordinates(), vec![point, point]);
}

#[test]
fn decodes_string_encoded_list() {
    let value = Value::String(
        r#"[{"lat":"31.36","lng":"48.73","title":"Ahvaz"},{"lat":30.43,"lng":48.18}]"#.into(),
    );

    let destinations = Destinations::decode(&value);

    assert_eq!(destinations.len(), 2);
    assert_eq!(destinations.as_slice()[0].lat, 31.36);
    assert_eq!(destinations.as_slice()[0].lng, 48.73);
    assert_eq!(destinations.as_slice()[1].title, "");
}

#[test]
fn wraps_single_object() {
    let value = Value::String(r#"{"lat":31.36,"lng":48.73,"title":"Ahvaz"}"#.into());

    let destinations = Destinations::decode(&value);

    assert_eq!(destinations.len(), 1);
    assert_eq!(destinations.last().unwrap().title, "Ahvaz");
}

#[test]
fn malformed_content_decodes_to_empty() {
    assert!(Destinations::decode(&Value::String("[{lat:".into())).is_empty());
    assert!(Destinations::decode(&Value::String("42".into())).is_empty());
    assert!(Destinations::decode(&serde_json::json!([{"lat": "north", "lng": 1}])).is_empty());
    assert!(Destinations::decode(&Value::Null).is_empty());
}

#[test]
fn out_of_range_coordinates_decode_to_empty() {
    let stored = Value::String(
        r#"[{"lat":31.36,"lng":48.73,"title":"Ahvaz"},{"lat":500,"lng":48}]"#.into(),
    );

    assert!(Destinations::decode(&stored).is_empty());
    assert!(Destinations::decode(&serde_json::json!({"lat": 31.36, "lng": -181})).is_empty());
    assert_eq!(Destinations::decode(&serde_json::json!({"lat": 90, "lng": 180})).len(), 1);
}

#[test]
fn encoded_field_round_trips_through_string() {
    #[derive(Serialize, Deserialize)]
    struct Order {
        #[serde(with = "encoded")]
        destinations: Destinations,
    }

    let order = Order {
        destinations: sample(),
    };

    let json = serde_json::to_value(&order).unwrap();
    assert!(json["destinations"].is_string());

    let decoded: Order = serde_json::from_value(json).unwrap();
    assert_eq!(decoded.destinations, sample());
}
