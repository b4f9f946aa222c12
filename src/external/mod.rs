mod backend;
mod nominatim;
mod osrm;

use async_trait::async_trait;

use crate::api::{MissionOrderAPI, RateSettingAPI, UnitLocationAPI};
use crate::entities::{Coordinates, MissionOrder, RouteComputation};
use crate::error::Error;

pub use backend::BackendClient;
pub use nominatim::Nominatim;
pub use osrm::Osrm;

/// Computes the forward leg (origin through every destination in order)
/// and the return leg (destinations reversed, back to origin).
#[async_trait]
pub trait RouteService {
    async fn compute_route(
        &self,
        origin: Coordinates,
        destinations: &[Coordinates],
    ) -> Result<RouteComputation, Error>;
}

#[async_trait]
pub trait Geocoder {
    async fn reverse_geocode(&self, point: Coordinates) -> Result<String, Error>;
}

#[async_trait]
pub trait RateProvider {
    /// `Ok(None)` when the backend answered without a usable rate.
    async fn fetch_rate_per_km(&self) -> Result<Option<f64>, Error>;
}

/// Mission order writes, issued by form submission with a computed cost.
#[async_trait]
pub trait MissionOrderStore {
    async fn create_mission_order(&self, order: MissionOrder) -> Result<MissionOrder, Error>;
    async fn update_mission_order(&self, id: i64, order: MissionOrder)
        -> Result<MissionOrder, Error>;
}

/// Everything the engine needs from the persistence backend.
pub trait Backend:
    UnitLocationAPI
    + RateSettingAPI
    + MissionOrderAPI
    + MissionOrderStore
    + RateProvider
    + Send
    + Sync
{
}

impl<T> Backend for T where
    T: UnitLocationAPI
        + RateSettingAPI
        + MissionOrderAPI
        + MissionOrderStore
        + RateProvider
        + Send
        + Sync
{
}
