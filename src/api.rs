use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::{
    Coordinates, MissionDetails, MissionForm, MissionOrder, RateSetting, RateSettingParams,
    UnitLocation, UnitLocationParams,
};
use crate::error::Error;

#[async_trait]
pub trait UnitLocationAPI {
    async fn list_unit_locations(&self) -> Result<Vec<UnitLocation>, Error>;
    async fn find_unit_location(&self, id: i64) -> Result<UnitLocation, Error>;
    async fn find_default_unit_location(&self) -> Result<UnitLocation, Error>;
    async fn create_unit_location(&self, params: UnitLocationParams)
        -> Result<UnitLocation, Error>;
    async fn update_unit_location(
        &self,
        id: i64,
        params: UnitLocationParams,
    ) -> Result<UnitLocation, Error>;
    async fn delete_unit_location(&self, id: i64) -> Result<(), Error>;
}

#[async_trait]
pub trait RateSettingAPI {
    async fn list_rate_settings(&self) -> Result<Vec<RateSetting>, Error>;
    async fn find_rate_setting(&self, id: i64) -> Result<RateSetting, Error>;
    async fn find_active_rate_setting(&self) -> Result<RateSetting, Error>;
    async fn create_rate_setting(&self, params: RateSettingParams) -> Result<RateSetting, Error>;
    async fn update_rate_setting(
        &self,
        id: i64,
        params: RateSettingParams,
    ) -> Result<RateSetting, Error>;
    async fn delete_rate_setting(&self, id: i64) -> Result<(), Error>;
}

/// Read and delete access to stored orders. Orders are written only by
/// submitting a mission form.
#[async_trait]
pub trait MissionOrderAPI {
    async fn list_mission_orders(&self) -> Result<Vec<MissionOrder>, Error>;
    async fn find_mission_order(&self, id: i64) -> Result<MissionOrder, Error>;
    async fn delete_mission_order(&self, id: i64) -> Result<(), Error>;
}

/// The create / edit workflow of a mission order, held server-side.
#[async_trait]
pub trait MissionFormAPI {
    async fn open_mission_form(&self, mission_order_id: Option<i64>)
        -> Result<MissionForm, Error>;
    async fn find_mission_form(&self, id: Uuid) -> Result<MissionForm, Error>;
    async fn update_mission_details(
        &self,
        id: Uuid,
        details: MissionDetails,
    ) -> Result<MissionForm, Error>;
    async fn select_origin(&self, id: Uuid, unit_id: i64) -> Result<MissionForm, Error>;
    async fn add_destination(&self, id: Uuid, point: Coordinates) -> Result<MissionForm, Error>;
    async fn remove_destination(&self, id: Uuid, index: usize) -> Result<MissionForm, Error>;
    async fn submit_mission_form(&self, id: Uuid) -> Result<MissionOrder, Error>;
    async fn discard_mission_form(&self, id: Uuid) -> Result<(), Error>;
}

pub trait API: UnitLocationAPI + RateSettingAPI + MissionOrderAPI + MissionFormAPI {}

pub type DynAPI = Arc<dyn API + Send + Sync>;
