use geo_types::{Coord, Point};
use serde::{Deserialize, Serialize};

use crate::entities::numeric::f64_strict;
use crate::error::{invalid_input_error, Error};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(deserialize_with = "f64_strict")]
    pub lat: f64,
    #[serde(deserialize_with = "f64_strict")]
    pub lng: f64,
}

impl Coordinates {
    /// Validated constructor for coordinates arriving from user input.
    pub fn new(lat: f64, lng: f64) -> Result<Self, Error> {
        let coordinates = Self { lat, lng };

        if !coordinates.is_valid() {
            return Err(invalid_input_error());
        }

        Ok(coordinates)
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// `"lat, lng"` with six decimals, the form's coordinate display.
    pub fn display(&self) -> String {
        format!("{:.6}, {:.6}", self.lat, self.lng)
    }
}

impl From<Coordinates> for Point<f64> {
    fn from(coordinates: Coordinates) -> Self {
        Point::new(coordinates.lng, coordinates.lat)
    }
}

impl From<Coord<f64>> for Coordinates {
    fn from(coord: Coord<f64>) -> Self {
        Self {
            lat: coord.y,
            lng: coord.x,
        }
    }
}

// waypoint notation used by OSRM-style routers: "lng,lat"
impl From<Coordinates> for String {
    fn from(coordinates: Coordinates) -> Self {
        let point: Point<f64> = coordinates.into();
        format!("{},{}", point.x(), point.y())
    }
}

#[test]
fn validates_ranges() {
    assert!(Coordinates::new(31.35, 48.72).is_ok());
    assert!(Coordinates::new(-90.0, 180.0).is_ok());
    assert!(Coordinates::new(91.0, 48.72).is_err());
    assert!(Coordinates::new(31.35, -180.5).is_err());
    assert!(Coordinates::new(f64::NAN, 0.0).is_err());
}

#[test]
fn waypoint_is_lng_first() {
    let waypoint: String = Coordinates { lat: 31.35, lng: 48.72 }.into();
    assert_eq!(waypoint, "48.72,31.35");
}

#[test]
fn decodes_string_coordinates() {
    let coordinates: Coordinates =
        serde_json::from_str(r#"{"lat": "31.36", "lng": 48.73}"#).unwrap();
    assert_eq!(coordinates, Coordinates { lat: 31.36, lng: 48.73 });
    assert_eq!(coordinates.display(), "31.360000, 48.730000");
}
