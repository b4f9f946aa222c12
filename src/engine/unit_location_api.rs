use super::Engine;

use async_trait::async_trait;

use crate::{
    api::UnitLocationAPI,
    entities::{Coordinates, UnitLocation, UnitLocationParams},
    error::{invalid_state_error, Error},
};

#[async_trait]
impl UnitLocationAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn list_unit_locations(&self) -> Result<Vec<UnitLocation>, Error> {
        self.backend.list_unit_locations().await
    }

    #[tracing::instrument(skip(self))]
    async fn find_unit_location(&self, id: i64) -> Result<UnitLocation, Error> {
        self.backend.find_unit_location(id).await
    }

    #[tracing::instrument(skip(self))]
    async fn find_default_unit_location(&self) -> Result<UnitLocation, Error> {
        self.backend.find_default_unit_location().await
    }

    #[tracing::instrument(skip(self))]
    async fn create_unit_location(
        &self,
        params: UnitLocationParams,
    ) -> Result<UnitLocation, Error> {
        Coordinates::new(params.latitude, params.longitude)?;

        self.backend.create_unit_location(params).await
    }

    #[tracing::instrument(skip(self))]
    async fn update_unit_location(
        &self,
        id: i64,
        params: UnitLocationParams,
    ) -> Result<UnitLocation, Error> {
        Coordinates::new(params.latitude, params.longitude)?;

        self.backend.update_unit_location(id, params).await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_unit_location(&self, id: i64) -> Result<(), Error> {
        let unit = self.backend.find_unit_location(id).await?;

        if unit.is_default {
            return Err(invalid_state_error());
        }

        self.backend.delete_unit_location(id).await
    }
}
