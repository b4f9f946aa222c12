use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{MissionOrderAPI, RateSettingAPI, UnitLocationAPI};
use crate::entities::{
    value_to_f64, MissionOrder, RateSetting, RateSettingParams, UnitLocation, UnitLocationParams,
};
use crate::error::{backend_error, not_found_error, upstream_error, Error};
use crate::external::{MissionOrderStore, RateProvider};

/// REST client for the persistence backend. Paths are relative to
/// `api_base`; every response is wrapped in a `{ data, message }` envelope.
#[derive(Clone, Debug)]
pub struct BackendClient {
    api_base: String,
    rate_setting_id: i64,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct Response<T> {
    data: Option<T>,
    message: Option<String>,
}

impl BackendClient {
    pub fn new(api_base: impl Into<String>, rate_setting_id: i64) -> Self {
        Self {
            api_base: api_base.into(),
            rate_setting_id,
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base.trim_end_matches('/'), path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let res = self.http.get(self.url(path)).send().await?;

        read_data(res).await
    }

    async fn send<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, Error>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let res = self
            .http
            .request(method, self.url(path))
            .json(body)
            .send()
            .await?;

        read_data(res).await
    }

    async fn delete(&self, path: &str) -> Result<(), Error> {
        let res = self.http.delete(self.url(path)).send().await?;

        check_status(res).await?;

        Ok(())
    }
}

async fn check_status(res: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status_code = res.status().as_u16();

    if status_code == 404 {
        return Err(not_found_error());
    } else if status_code >= 400 && status_code < 500 {
        let body: Option<Response<Value>> = res.json().await.ok();
        return Err(backend_error(body.and_then(|body| body.message)));
    } else if !(200..300).contains(&status_code) {
        return Err(upstream_error());
    }

    Ok(res)
}

async fn read_data<T: DeserializeOwned>(res: reqwest::Response) -> Result<T, Error> {
    let body = check_status(res).await?.bytes().await?;
    let envelope: Response<T> = serde_json::from_slice(&body)?;

    envelope.data.ok_or_else(upstream_error)
}

#[async_trait]
impl UnitLocationAPI for BackendClient {
    #[tracing::instrument(skip(self))]
    async fn list_unit_locations(&self) -> Result<Vec<UnitLocation>, Error> {
        self.get("unit-locations").await
    }

    #[tracing::instrument(skip(self))]
    async fn find_unit_location(&self, id: i64) -> Result<UnitLocation, Error> {
        self.get(&format!("unit-locations/{}", id)).await
    }

    #[tracing::instrument(skip(self))]
    async fn find_default_unit_location(&self) -> Result<UnitLocation, Error> {
        self.get("unit-locations/default").await
    }

    #[tracing::instrument(skip(self))]
    async fn create_unit_location(
        &self,
        params: UnitLocationParams,
    ) -> Result<UnitLocation, Error> {
        self.send(Method::POST, "unit-locations/create", &params)
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn update_unit_location(
        &self,
        id: i64,
        params: UnitLocationParams,
    ) -> Result<UnitLocation, Error> {
        self.send(Method::PUT, &format!("unit-locations/update/{}", id), &params)
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_unit_location(&self, id: i64) -> Result<(), Error> {
        self.delete(&format!("unit-locations/delete/{}", id)).await
    }
}

#[async_trait]
impl RateSettingAPI for BackendClient {
    #[tracing::instrument(skip(self))]
    async fn list_rate_settings(&self) -> Result<Vec<RateSetting>, Error> {
        self.get("rate-settings/getAll").await
    }

    #[tracing::instrument(skip(self))]
    async fn find_rate_setting(&self, id: i64) -> Result<RateSetting, Error> {
        self.get(&format!("rate-settings/{}", id)).await
    }

    #[tracing::instrument(skip(self))]
    async fn find_active_rate_setting(&self) -> Result<RateSetting, Error> {
        self.get("rate-settings/getActive").await
    }

    #[tracing::instrument(skip(self))]
    async fn create_rate_setting(&self, params: RateSettingParams) -> Result<RateSetting, Error> {
        self.send(Method::POST, "rate-settings/create", &params)
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn update_rate_setting(
        &self,
        id: i64,
        params: RateSettingParams,
    ) -> Result<RateSetting, Error> {
        self.send(Method::PUT, &format!("rate-settings/update/{}", id), &params)
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_rate_setting(&self, id: i64) -> Result<(), Error> {
        self.delete(&format!("rate-settings/delete/{}", id)).await
    }
}

#[async_trait]
impl MissionOrderAPI for BackendClient {
    #[tracing::instrument(skip(self))]
    async fn list_mission_orders(&self) -> Result<Vec<MissionOrder>, Error> {
        self.get("mission-orders/getAll").await
    }

    #[tracing::instrument(skip(self))]
    async fn find_mission_order(&self, id: i64) -> Result<MissionOrder, Error> {
        self.get(&format!("mission-orders/getOne/{}", id)).await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_mission_order(&self, id: i64) -> Result<(), Error> {
        self.delete(&format!("mission-orders/delete/{}", id)).await
    }
}

#[async_trait]
impl MissionOrderStore for BackendClient {
    #[tracing::instrument(skip(self, order))]
    async fn create_mission_order(&self, order: MissionOrder) -> Result<MissionOrder, Error> {
        self.send(Method::POST, "mission-orders/create", &order)
            .await
    }

    #[tracing::instrument(skip(self, order))]
    async fn update_mission_order(
        &self,
        id: i64,
        order: MissionOrder,
    ) -> Result<MissionOrder, Error> {
        self.send(Method::PUT, &format!("mission-orders/update/{}", id), &order)
            .await
    }
}

#[async_trait]
impl RateProvider for BackendClient {
    #[tracing::instrument(skip(self), fields(rate_setting_id = self.rate_setting_id))]
    async fn fetch_rate_per_km(&self) -> Result<Option<f64>, Error> {
        let setting: Value = self
            .get(&format!("rate-settings/{}", self.rate_setting_id))
            .await?;

        Ok(setting.get("ratePerKm").and_then(value_to_f64))
    }
}

#[test]
fn joins_paths_onto_base() {
    let client = BackendClient::new("http://localhost:3000/aryafoulad/", 1);

    assert_eq!(
        client.url("mission-orders/getOne/7"),
        "http://localhost:3000/aryafoulad/mission-orders/getOne/7"
    );
}

#[test]
fn envelope_tolerates_missing_message() {
    let envelope: Response<Vec<UnitLocation>> = serde_json::from_value(serde_json::json!({
        "data": [{ "id": 1, "name": "HQ", "latitude": "31.35", "longitude": 48.72, "isDefault": true }]
    }))
    .unwrap();

    assert!(envelope.message.is_none());
    assert_eq!(envelope.data.unwrap()[0].latitude, 31.35);
}
