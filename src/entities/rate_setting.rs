use serde::{Deserialize, Serialize};

use crate::entities::numeric::{f64_strict, string_or_empty};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateSetting {
    pub id: i64,
    #[serde(deserialize_with = "f64_strict")]
    pub rate_per_km: f64,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateSettingParams {
    #[serde(deserialize_with = "f64_strict")]
    pub rate_per_km: f64,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub description: String,
}

#[test]
fn decodes_decimal_rate() {
    let rate: RateSetting =
        serde_json::from_str(r#"{"id": 1, "ratePerKm": "5000.00", "description": null}"#).unwrap();

    assert_eq!(rate.rate_per_km, 5000.0);
    assert_eq!(rate.description, "");
}
