use serde::{Deserialize, Serialize};

use crate::entities::calendar_date::optional_day;
use crate::entities::destination::encoded;
use crate::entities::numeric::{f64_or_zero, optional_f64, string_or_empty};
use crate::entities::{CalendarDate, Destinations, RouteSummary};

/// A mission order as persisted by the backend.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionOrder {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(flatten)]
    pub details: MissionDetails,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub from_unit: String,
    #[serde(default, with = "encoded")]
    pub destinations: Destinations,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub mission_location: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub mission_coordinates: String,
    #[serde(default, deserialize_with = "f64_or_zero")]
    pub forward_distance: f64,
    #[serde(default, deserialize_with = "f64_or_zero")]
    pub return_distance: f64,
    #[serde(default, deserialize_with = "f64_or_zero")]
    pub total_distance: f64,
    #[serde(default, deserialize_with = "f64_or_zero")]
    pub forward_time: f64,
    #[serde(default, deserialize_with = "f64_or_zero")]
    pub return_time: f64,
    #[serde(default, deserialize_with = "f64_or_zero")]
    pub total_time: f64,
    #[serde(default, deserialize_with = "f64_or_zero")]
    pub final_cost: f64,
}

/// The operator-editable part of a mission order: personnel and schedule.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionDetails {
    #[serde(default, deserialize_with = "string_or_empty")]
    pub first_name: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub last_name: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub personnel_number: String,
    #[serde(default, deserialize_with = "optional_day")]
    pub day: Option<CalendarDate>,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub time: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub mission_subject: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub mission_description: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub companions: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub transport: String,
    #[serde(default, deserialize_with = "optional_f64")]
    pub total_weight_kg: Option<f64>,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub session_code: String,
}

impl MissionOrder {
    pub fn summary(&self) -> RouteSummary {
        RouteSummary {
            forward_distance_km: self.forward_distance,
            return_distance_km: self.return_distance,
            total_distance_km: self.total_distance,
            forward_duration_hours: self.forward_time,
            return_duration_hours: self.return_time,
            total_duration_hours: self.total_time,
        }
    }

    pub fn set_summary(&mut self, summary: RouteSummary) {
        self.forward_distance = summary.forward_distance_km;
        self.return_distance = summary.return_distance_km;
        self.total_distance = summary.total_distance_km;
        self.forward_time = summary.forward_duration_hours;
        self.return_time = summary.return_duration_hours;
        self.total_time = summary.total_duration_hours;
    }
}

#[test]
fn reloads_string_encoded_destinations() {
    let order: MissionOrder = serde_json::from_value(serde_json::json!({
        "id": 7,
        "firstName": "Sara",
        "personnelNumber": 1042,
        "fromUnit": "HQ",
        "day": "2024-05-01T00:00:00.000Z",
        "totalWeightKg": "",
        "destinations": "[{\"lat\":\"31.36\",\"lng\":\"48.73\",\"title\":\"Ahvaz\"}]",
        "totalDistance": "20.00",
        "finalCost": 100000,
        "createdAt": "2024-04-30T10:00:00.000Z"
    }))
    .unwrap();

    assert_eq!(order.id, Some(7));
    assert_eq!(order.details.first_name, "Sara");
    assert_eq!(order.details.personnel_number, "1042");
    assert_eq!(order.details.day, Some(CalendarDate::new(2024, 5, 1).unwrap()));
    assert_eq!(order.details.total_weight_kg, None);
    assert_eq!(order.destinations.len(), 1);
    assert_eq!(order.destinations.as_slice()[0].lat, 31.36);
    assert_eq!(order.destinations.as_slice()[0].lng, 48.73);
    assert_eq!(order.total_distance, 20.0);
    assert_eq!(order.final_cost, 100000.0);
    assert_eq!(order.forward_time, 0.0);
}

#[test]
fn malformed_destinations_do_not_fail_the_order() {
    let order: MissionOrder = serde_json::from_value(serde_json::json!({
        "id": 8,
        "destinations": "not json",
        "day": null
    }))
    .unwrap();

    assert!(order.destinations.is_empty());
    assert_eq!(order.details.day, None);
}

#[test]
fn submission_payload_shape() {
    use crate::entities::{Coordinates, Destination};

    let mut order = MissionOrder {
        from_unit: "HQ".into(),
        final_cost: 100000.0,
        ..Default::default()
    };
    order.details.day = Some(CalendarDate::new(2024, 5, 1).unwrap());
    order.destinations.add(Destination::new(
        Coordinates { lat: 31.36, lng: 48.73 },
        "Ahvaz".into(),
    ));

    let json = serde_json::to_value(&order).unwrap();

    assert!(json.get("id").is_none());
    assert!(json.get("ratePerKm").is_none());
    assert_eq!(json["day"], "2024-05-01");
    assert_eq!(json["fromUnit"], "HQ");
    assert_eq!(json["finalCost"], 100000.0);

    let encoded = json["destinations"].as_str().unwrap();
    let decoded: serde_json::Value = serde_json::from_str(encoded).unwrap();
    assert_eq!(decoded[0]["lat"], 31.36);
    assert_eq!(decoded[0]["title"], "Ahvaz");
}
