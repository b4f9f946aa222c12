use serde::{Deserialize, Serialize};

use crate::entities::numeric::f64_strict;
use crate::entities::Coordinates;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitLocation {
    pub id: i64,
    pub name: String,
    #[serde(deserialize_with = "f64_strict")]
    pub latitude: f64,
    #[serde(deserialize_with = "f64_strict")]
    pub longitude: f64,
    #[serde(default)]
    pub is_default: bool,
}

/// Body of a create / update call; the backend assigns the id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitLocationParams {
    pub name: String,
    #[serde(deserialize_with = "f64_strict")]
    pub latitude: f64,
    #[serde(deserialize_with = "f64_strict")]
    pub longitude: f64,
    #[serde(default)]
    pub is_default: bool,
}

impl UnitLocation {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.latitude,
            lng: self.longitude,
        }
    }
}

impl UnitLocationParams {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.latitude,
            lng: self.longitude,
        }
    }
}

/// The unit flagged as the default mission origin, if any.
pub fn default_unit(units: &[UnitLocation]) -> Option<&UnitLocation> {
    units.iter().find(|unit| unit.is_default)
}

#[test]
fn decodes_backend_unit_location() {
    let unit: UnitLocation = serde_json::from_str(
        r#"{"id": 3, "name": "HQ", "latitude": "31.348808", "longitude": 48.722882, "isDefault": true}"#,
    )
    .unwrap();

    assert_eq!(unit.id, 3);
    assert!(unit.is_default);
    assert_eq!(
        unit.coordinates(),
        Coordinates {
            lat: 31.348808,
            lng: 48.722882
        }
    );
}

#[test]
fn finds_default_unit() {
    let units = vec![
        UnitLocation {
            id: 1,
            name: "Branch".into(),
            latitude: 31.0,
            longitude: 48.0,
            is_default: false,
        },
        UnitLocation {
            id: 2,
            name: "HQ".into(),
            latitude: 31.35,
            longitude: 48.72,
            is_default: true,
        },
    ];

    assert_eq!(default_unit(&units).map(|unit| unit.id), Some(2));
    assert!(default_unit(&units[..1]).is_none());
}
