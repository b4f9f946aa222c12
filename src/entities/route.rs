use serde::{Deserialize, Serialize};

use crate::entities::Coordinates;

/// One routed direction: origin through all destinations, or back.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteLeg {
    pub path: Vec<Coordinates>,
    pub distance_km: f64,
    pub duration_hours: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteComputation {
    pub forward_path: Vec<Coordinates>,
    pub return_path: Vec<Coordinates>,
    pub forward_distance_km: f64,
    pub return_distance_km: f64,
    pub total_distance_km: f64,
    pub forward_duration_hours: f64,
    pub return_duration_hours: f64,
    pub total_duration_hours: f64,
}

/// The scalar part of a route, the only part that is ever persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSummary {
    pub forward_distance_km: f64,
    pub return_distance_km: f64,
    pub total_distance_km: f64,
    pub forward_duration_hours: f64,
    pub return_duration_hours: f64,
    pub total_duration_hours: f64,
}

impl RouteComputation {
    pub fn new(forward: RouteLeg, back: RouteLeg) -> Self {
        Self {
            forward_distance_km: forward.distance_km,
            return_distance_km: back.distance_km,
            total_distance_km: round2(forward.distance_km + back.distance_km),
            forward_duration_hours: forward.duration_hours,
            return_duration_hours: back.duration_hours,
            total_duration_hours: round2(forward.duration_hours + back.duration_hours),
            forward_path: forward.path,
            return_path: back.path,
        }
    }

    /// A route known only by its persisted scalars, with no geometry.
    pub fn from_summary(summary: RouteSummary) -> Self {
        Self {
            forward_path: vec![],
            return_path: vec![],
            forward_distance_km: summary.forward_distance_km,
            return_distance_km: summary.return_distance_km,
            total_distance_km: summary.total_distance_km,
            forward_duration_hours: summary.forward_duration_hours,
            return_duration_hours: summary.return_duration_hours,
            total_duration_hours: summary.total_duration_hours,
        }
    }

    pub fn summary(&self) -> RouteSummary {
        RouteSummary {
            forward_distance_km: self.forward_distance_km,
            return_distance_km: self.return_distance_km,
            total_distance_km: self.total_distance_km,
            forward_duration_hours: self.forward_duration_hours,
            return_duration_hours: self.return_duration_hours,
            total_duration_hours: self.total_duration_hours,
        }
    }
}

impl RouteSummary {
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[test]
fn totals_are_sums_of_legs() {
    let forward = RouteLeg {
        path: vec![Coordinates { lat: 31.35, lng: 48.72 }, Coordinates { lat: 31.36, lng: 48.73 }],
        distance_km: 10.0,
        duration_hours: 0.5,
    };
    let back = RouteLeg {
        path: vec![Coordinates { lat: 31.36, lng: 48.73 }, Coordinates { lat: 31.35, lng: 48.72 }],
        distance_km: 12.25,
        duration_hours: 0.6,
    };

    let route = RouteComputation::new(forward, back);

    assert_eq!(route.total_distance_km, 22.25);
    assert_eq!(route.total_duration_hours, 1.1);
    assert_eq!(route.forward_path.len(), 2);
    assert_eq!(route.return_path[0], Coordinates { lat: 31.36, lng: 48.73 });
}

#[test]
fn summary_only_route_has_no_geometry() {
    let summary = RouteSummary {
        forward_distance_km: 10.0,
        return_distance_km: 10.0,
        total_distance_km: 20.0,
        forward_duration_hours: 0.5,
        return_duration_hours: 0.5,
        total_duration_hours: 1.0,
    };

    let route = RouteComputation::from_summary(summary);

    assert!(route.forward_path.is_empty() && route.return_path.is_empty());
    assert_eq!(route.summary(), summary);
    assert!(RouteSummary::default().is_zero());
}
