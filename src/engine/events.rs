use serde::Serialize;
use uuid::Uuid;

/// Notifications from the mission form workflow. Route failures travel
/// here instead of failing the operation that triggered them.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Event {
    RateResolved { form_id: Uuid, rate_per_km: f64 },
    RouteUpdated { form_id: Uuid, seq: u64, final_cost: f64 },
    RouteCleared { form_id: Uuid },
    RouteFailed { form_id: Uuid, seq: u64, message: String },
    StaleRouteDiscarded { form_id: Uuid, seq: u64 },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RateResolved { .. } => "rate_resolved",
            Self::RouteUpdated { .. } => "route_updated",
            Self::RouteCleared { .. } => "route_cleared",
            Self::RouteFailed { .. } => "route_failed",
            Self::StaleRouteDiscarded { .. } => "stale_route_discarded",
        }
    }

    pub fn form_id(&self) -> Uuid {
        match self {
            Self::RateResolved { form_id, .. }
            | Self::RouteUpdated { form_id, .. }
            | Self::RouteCleared { form_id }
            | Self::RouteFailed { form_id, .. }
            | Self::StaleRouteDiscarded { form_id, .. } => *form_id,
        }
    }
}

#[test]
fn serializes_with_name_tag() {
    let id = Uuid::new_v4();
    let json = serde_json::to_value(Event::RouteFailed {
        form_id: id,
        seq: 3,
        message: "upstream error".into(),
    })
    .unwrap();

    assert_eq!(json["name"], "route_failed");
    assert_eq!(json["seq"], 3);
    assert_eq!(Event::RouteCleared { form_id: id }.form_id(), id);
}
