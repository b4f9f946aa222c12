use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::cost::compute_final_cost;
use crate::entities::unit_location::default_unit;
use crate::entities::{
    Coordinates, Destination, Destinations, MissionDetails, MissionOrder, RouteComputation,
    RouteSummary, UnitLocation,
};
use crate::error::{invalid_input_error, invalid_state_error, Error};

/// Server-side state of one create / edit form session.
///
/// Route recalculation is requested by the mutating operations and
/// executed elsewhere; each request carries a sequence number and only a
/// result for the most recently issued number is applied.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionForm {
    pub id: Uuid,
    pub mission_order_id: Option<i64>,
    pub rate: RateStatus,
    pub units: Vec<UnitLocation>,
    pub origin: Option<UnitLocation>,
    pub destinations: Destinations,
    pub details: MissionDetails,
    pub mission_location: String,
    pub mission_coordinates: String,
    pub route: Option<RouteComputation>,
    pub final_cost: f64,
    pub last_error: Option<String>,
    #[serde(skip)]
    issued: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum RateStatus {
    Loading,
    Ready {
        #[serde(rename = "ratePerKm")]
        rate_per_km: f64,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct RouteRequest {
    pub form_id: Uuid,
    pub seq: u64,
    pub origin: Coordinates,
    pub destinations: Vec<Coordinates>,
}

impl RateStatus {
    pub fn name(&self) -> String {
        match self {
            Self::Loading => "loading".into(),
            Self::Ready { rate_per_km: _ } => "ready".into(),
        }
    }
}

impl MissionForm {
    /// A blank form whose origin is the default unit, if one exists.
    pub fn new(units: Vec<UnitLocation>) -> Self {
        let origin = default_unit(&units).cloned();

        Self {
            id: Uuid::new_v4(),
            mission_order_id: None,
            rate: RateStatus::Loading,
            units,
            origin,
            destinations: Destinations::new(),
            details: MissionDetails::default(),
            mission_location: String::new(),
            mission_coordinates: String::new(),
            route: None,
            final_cost: 0.0,
            last_error: None,
            issued: 0,
        }
    }

    /// A form pre-filled from a persisted order. The origin is resolved by
    /// unit name; the persisted summary is shown until the first
    /// recalculation replaces it.
    pub fn for_order(order: MissionOrder, units: Vec<UnitLocation>) -> Self {
        let origin = units
            .iter()
            .find(|unit| unit.name == order.from_unit)
            .cloned();

        if origin.is_none() {
            tracing::warn!(from_unit = %order.from_unit, "origin unit of mission order not found");
        }

        let summary = order.summary();
        let route = match summary.is_zero() {
            true => None,
            false => Some(RouteComputation::from_summary(summary)),
        };

        Self {
            id: Uuid::new_v4(),
            mission_order_id: order.id,
            rate: RateStatus::Loading,
            units,
            origin,
            destinations: order.destinations,
            details: order.details,
            mission_location: order.mission_location,
            mission_coordinates: order.mission_coordinates,
            route,
            final_cost: order.final_cost,
            last_error: None,
            issued: 0,
        }
    }

    pub fn rate_per_km(&self) -> Option<f64> {
        match self.rate {
            RateStatus::Ready { rate_per_km } => Some(rate_per_km),
            RateStatus::Loading => None,
        }
    }

    pub fn summary(&self) -> RouteSummary {
        self.route
            .as_ref()
            .map(RouteComputation::summary)
            .unwrap_or_default()
    }

    /// The sequence number of the most recently issued recalculation.
    pub fn latest_request(&self) -> u64 {
        self.issued
    }

    #[tracing::instrument(skip(self), fields(form_id = %self.id))]
    pub fn add_destination(&mut self, destination: Destination) -> Option<RouteRequest> {
        self.destinations.add(destination);
        self.track_last_destination();

        self.recalculation()
    }

    #[tracing::instrument(skip(self), fields(form_id = %self.id))]
    pub fn remove_destination(&mut self, index: usize) -> Result<Option<RouteRequest>, Error> {
        self.destinations.remove_at(index)?;
        self.track_last_destination();

        if self.destinations.is_empty() {
            self.clear_route();
            return Ok(None);
        }

        Ok(self.recalculation())
    }

    #[tracing::instrument(skip(self), fields(form_id = %self.id))]
    pub fn select_origin(&mut self, unit_id: i64) -> Result<Option<RouteRequest>, Error> {
        let unit = self
            .units
            .iter()
            .find(|unit| unit.id == unit_id)
            .cloned()
            .ok_or_else(invalid_input_error)?;

        self.origin = Some(unit);

        if self.destinations.is_empty() {
            return Ok(None);
        }

        Ok(self.recalculation())
    }

    /// Moves the form from `Loading` to `Ready`. The rate is fetched once
    /// per session; later resolutions are ignored.
    #[tracing::instrument(skip(self), fields(form_id = %self.id))]
    pub fn resolve_rate(&mut self, rate_per_km: f64) -> Option<RouteRequest> {
        if let RateStatus::Ready { rate_per_km: _ } = self.rate {
            return None;
        }

        self.rate = RateStatus::Ready { rate_per_km };

        self.recalculation()
    }

    /// Issues a recalculation if the rate is resolved, an origin is
    /// selected and at least one destination exists.
    pub fn recalculation(&mut self) -> Option<RouteRequest> {
        self.rate_per_km()?;

        let origin = self.origin.as_ref()?.coordinates();

        if self.destinations.is_empty() {
            return None;
        }

        self.issued += 1;

        Some(RouteRequest {
            form_id: self.id,
            seq: self.issued,
            origin,
            destinations: self.destinations.coordinates(),
        })
    }

    /// Applies a route result. Returns false, leaving the form untouched,
    /// when a newer request has been issued since `seq`.
    pub fn apply_route(&mut self, seq: u64, route: RouteComputation) -> bool {
        if seq != self.issued {
            return false;
        }

        let rate_per_km = match self.rate_per_km() {
            Some(rate_per_km) => rate_per_km,
            None => return false,
        };

        self.final_cost = compute_final_cost(route.total_distance_km, rate_per_km);
        self.route = Some(route);
        self.last_error = None;

        true
    }

    /// Records a failed recalculation. Previously displayed route and cost
    /// stay as they are.
    pub fn record_failure(&mut self, seq: u64, message: String) -> bool {
        if seq != self.issued {
            return false;
        }

        self.last_error = Some(message);

        true
    }

    /// Zeroes every route-derived field and drops the geometry. Advances
    /// the sequence so in-flight results are discarded.
    pub fn clear_route(&mut self) {
        self.route = None;
        self.final_cost = 0.0;
        self.last_error = None;
        self.issued += 1;
    }

    pub fn update_details(&mut self, details: MissionDetails) {
        self.details = details;
    }

    pub fn to_mission_order(&self) -> Result<MissionOrder, Error> {
        let origin = self.origin.as_ref().ok_or_else(invalid_state_error)?;

        let mut order = MissionOrder {
            id: self.mission_order_id,
            details: self.details.clone(),
            from_unit: origin.name.clone(),
            destinations: self.destinations.clone(),
            mission_location: self.mission_location.clone(),
            mission_coordinates: self.mission_coordinates.clone(),
            final_cost: self.final_cost,
            ..Default::default()
        };
        order.set_summary(self.summary());

        Ok(order)
    }

    /// Empties the form after a successful create, keeping the session's
    /// units, origin and rate.
    pub fn reset(&mut self) {
        self.details = MissionDetails::default();
        self.destinations.clear();
        self.track_last_destination();
        self.clear_route();
    }

    fn track_last_destination(&mut self) {
        match self.destinations.last() {
            Some(last) => {
                self.mission_coordinates = last.coordinates().display();
                self.mission_location = last.title.clone();
            }
            None => {
                self.mission_coordinates = String::new();
                self.mission_location = String::new();
            }
        }
    }
}

#[cfg(test)]
fn units() -> Vec<UnitLocation> {
    vec![
        UnitLocation {
            id: 1,
            name: "HQ".into(),
            latitude: 31.35,
            longitude: 48.72,
            is_default: true,
        },
        UnitLocation {
            id: 2,
            name: "Port".into(),
            latitude: 30.43,
            longitude: 48.18,
            is_default: false,
        },
    ]
}

#[cfg(test)]
fn ahvaz() -> Destination {
    Destination::new(Coordinates { lat: 31.36, lng: 48.73 }, "Ahvaz".into())
}

#[cfg(test)]
fn scenario_route() -> RouteComputation {
    use crate::entities::RouteLeg;

    RouteComputation::new(
        RouteLeg {
            path: vec![Coordinates { lat: 31.35, lng: 48.72 }, Coordinates { lat: 31.36, lng: 48.73 }],
            distance_km: 10.0,
            duration_hours: 0.5,
        },
        RouteLeg {
            path: vec![Coordinates { lat: 31.36, lng: 48.73 }, Coordinates { lat: 31.35, lng: 48.72 }],
            distance_km: 10.0,
            duration_hours: 0.5,
        },
    )
}

#[test]
fn new_form_uses_default_unit_as_origin() {
    let form = MissionForm::new(units());

    assert_eq!(form.origin.as_ref().map(|unit| unit.id), Some(1));
    assert_eq!(form.rate, RateStatus::Loading);
    assert_eq!(form.rate.name(), "loading");
}

#[test]
fn no_recalculation_while_rate_is_loading() {
    let mut form = MissionForm::new(units());

    assert_eq!(form.add_destination(ahvaz()), None);
    assert_eq!(form.select_origin(2).unwrap(), None);
    assert_eq!(form.recalculation(), None);

    assert_eq!(form.destinations.len(), 1);
    assert_eq!(form.route, None);
    assert_eq!(form.final_cost, 0.0);
    assert_eq!(form.latest_request(), 0);
}

#[test]
fn resolving_rate_recalculates_existing_destinations() {
    let mut form = MissionForm::new(units());
    form.add_destination(ahvaz());

    let request = form.resolve_rate(5000.0).unwrap();

    assert_eq!(request.seq, 1);
    assert_eq!(request.origin, Coordinates { lat: 31.35, lng: 48.72 });
    assert_eq!(request.destinations, vec![Coordinates { lat: 31.36, lng: 48.73 }]);

    // the rate is resolved once per session
    assert_eq!(form.resolve_rate(1.0), None);
    assert_eq!(form.rate_per_km(), Some(5000.0));
}

#[test]
fn resolving_rate_without_destinations_issues_nothing() {
    let mut form = MissionForm::new(units());

    assert_eq!(form.resolve_rate(5000.0), None);
    assert_eq!(form.rate.name(), "ready");
}

#[test]
fn scenario_single_destination_priced() {
    let mut form = MissionForm::new(units());
    form.resolve_rate(5000.0);

    let request = form.add_destination(ahvaz()).unwrap();
    assert!(form.apply_route(request.seq, scenario_route()));

    let summary = form.summary();
    assert_eq!(summary.total_distance_km, 20.0);
    assert_eq!(summary.total_duration_hours, 1.0);
    assert_eq!(form.final_cost, 100000.0);
    assert_eq!(form.mission_coordinates, "31.360000, 48.730000");
    assert_eq!(form.mission_location, "Ahvaz");
}

#[test]
fn scenario_removing_last_destination_clears_route() {
    let mut form = MissionForm::new(units());
    form.resolve_rate(5000.0);
    let request = form.add_destination(ahvaz()).unwrap();
    form.apply_route(request.seq, scenario_route());

    assert_eq!(form.remove_destination(0).unwrap(), None);

    assert!(form.summary().is_zero());
    assert_eq!(form.final_cost, 0.0);
    assert_eq!(form.route, None);
    assert_eq!(form.mission_coordinates, "");
    assert_eq!(form.mission_location, "");
}

#[test]
fn clearing_happens_even_while_rate_is_loading() {
    let order = MissionOrder {
        id: Some(3),
        from_unit: "HQ".into(),
        destinations: vec![ahvaz()].into(),
        total_distance: 20.0,
        final_cost: 100000.0,
        ..Default::default()
    };
    let mut form = MissionForm::for_order(order, units());
    assert_eq!(form.summary().total_distance_km, 20.0);

    form.remove_destination(0).unwrap();

    assert!(form.summary().is_zero());
    assert_eq!(form.final_cost, 0.0);
}

#[test]
fn zero_rate_prices_route_at_zero() {
    let mut form = MissionForm::new(units());
    form.resolve_rate(0.0);

    let request = form.add_destination(ahvaz()).unwrap();
    assert!(form.apply_route(request.seq, scenario_route()));

    assert_eq!(form.summary().total_distance_km, 20.0);
    assert_eq!(form.final_cost, 0.0);
}

#[test]
fn stale_results_are_discarded() {
    let mut form = MissionForm::new(units());
    form.resolve_rate(5000.0);

    let first = form.add_destination(ahvaz()).unwrap();
    let second = form
        .add_destination(Destination::new(
            Coordinates { lat: 30.43, lng: 48.18 },
            "Abadan".into(),
        ))
        .unwrap();
    assert!(second.seq > first.seq);

    let mut newer = scenario_route();
    newer.total_distance_km = 55.0;
    assert!(form.apply_route(second.seq, newer));

    // the older response arrives late
    assert!(!form.apply_route(first.seq, scenario_route()));
    assert!(!form.record_failure(first.seq, "timeout".into()));

    assert_eq!(form.summary().total_distance_km, 55.0);
    assert_eq!(form.final_cost, 275000.0);
    assert_eq!(form.last_error, None);
}

#[test]
fn in_flight_result_cannot_resurrect_cleared_route() {
    let mut form = MissionForm::new(units());
    form.resolve_rate(5000.0);

    let request = form.add_destination(ahvaz()).unwrap();
    form.remove_destination(0).unwrap();

    assert!(!form.apply_route(request.seq, scenario_route()));
    assert_eq!(form.route, None);
}

#[test]
fn failure_keeps_previous_route() {
    let mut form = MissionForm::new(units());
    form.resolve_rate(5000.0);
    let request = form.add_destination(ahvaz()).unwrap();
    form.apply_route(request.seq, scenario_route());

    let request = form.select_origin(2).unwrap().unwrap();
    assert_eq!(request.origin, Coordinates { lat: 30.43, lng: 48.18 });
    assert!(form.record_failure(request.seq, "upstream error".into()));

    assert_eq!(form.summary().total_distance_km, 20.0);
    assert_eq!(form.final_cost, 100000.0);
    assert_eq!(form.last_error.as_deref(), Some("upstream error"));
}

#[test]
fn removal_recalculates_remaining_in_order() {
    let mut form = MissionForm::new(units());
    form.resolve_rate(5000.0);
    form.add_destination(ahvaz());
    form.add_destination(Destination::new(
        Coordinates { lat: 30.43, lng: 48.18 },
        "Abadan".into(),
    ));
    form.add_destination(Destination::new(
        Coordinates { lat: 32.38, lng: 48.40 },
        "Dezful".into(),
    ));

    let request = form.remove_destination(1).unwrap().unwrap();

    assert_eq!(
        request.destinations,
        vec![
            Coordinates { lat: 31.36, lng: 48.73 },
            Coordinates { lat: 32.38, lng: 48.40 }
        ]
    );
    assert_eq!(form.mission_location, "Dezful");
}

#[test]
fn origin_change_without_destinations_does_not_recalculate() {
    let mut form = MissionForm::new(units());
    form.resolve_rate(5000.0);

    assert_eq!(form.select_origin(2).unwrap(), None);
    assert_eq!(form.origin.as_ref().map(|unit| unit.id), Some(2));
    assert_eq!(form.select_origin(99).unwrap_err(), invalid_input_error());
}

#[test]
fn edit_form_resolves_origin_by_name() {
    let order = MissionOrder {
        id: Some(9),
        from_unit: "Port".into(),
        destinations: vec![ahvaz()].into(),
        ..Default::default()
    };

    let mut form = MissionForm::for_order(order, units());

    assert_eq!(form.mission_order_id, Some(9));
    assert_eq!(form.origin.as_ref().map(|unit| unit.id), Some(2));
    assert_eq!(form.route, None);

    let request = form.resolve_rate(5000.0).unwrap();
    assert_eq!(request.origin, Coordinates { lat: 30.43, lng: 48.18 });
}

#[test]
fn edit_form_with_unknown_unit_has_no_origin() {
    let order = MissionOrder {
        from_unit: "Closed branch".into(),
        destinations: vec![ahvaz()].into(),
        ..Default::default()
    };

    let mut form = MissionForm::for_order(order, units());

    assert!(form.origin.is_none());
    assert_eq!(form.resolve_rate(5000.0), None);
    assert_eq!(form.to_mission_order().unwrap_err(), invalid_state_error());
}

#[test]
fn builds_mission_order_for_submission() {
    let mut form = MissionForm::new(units());
    form.resolve_rate(5000.0);
    let request = form.add_destination(ahvaz()).unwrap();
    form.apply_route(request.seq, scenario_route());
    form.update_details(MissionDetails {
        first_name: "Sara".into(),
        ..Default::default()
    });

    let order = form.to_mission_order().unwrap();

    assert_eq!(order.id, None);
    assert_eq!(order.from_unit, "HQ");
    assert_eq!(order.details.first_name, "Sara");
    assert_eq!(order.destinations.len(), 1);
    assert_eq!(order.total_distance, 20.0);
    assert_eq!(order.total_time, 1.0);
    assert_eq!(order.final_cost, 100000.0);

    form.reset();
    assert!(form.destinations.is_empty());
    assert_eq!(form.details, MissionDetails::default());
    assert_eq!(form.final_cost, 0.0);
    assert_eq!(form.rate_per_km(), Some(5000.0));
}

#[test]
fn serializes_in_camel_case() {
    let mut form = MissionForm::new(units());
    form.resolve_rate(5000.0);
    let request = form.add_destination(ahvaz()).unwrap();
    form.apply_route(request.seq, scenario_route());

    let json = serde_json::to_value(&form).unwrap();

    assert_eq!(json["finalCost"], 100000.0);
    assert_eq!(json["missionOrderId"], serde_json::Value::Null);
    assert_eq!(json["rate"]["name"], "ready");
    assert_eq!(json["rate"]["ratePerKm"], 5000.0);
    assert_eq!(json["route"]["totalDistanceKm"], 20.0);
    assert!(json.get("final_cost").is_none());
    assert!(json.get("issued").is_none());
}
