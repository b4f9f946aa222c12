use super::Engine;

use async_trait::async_trait;

use crate::{
    api::RateSettingAPI,
    entities::{RateSetting, RateSettingParams},
    error::{invalid_input_error, Error},
};

#[async_trait]
impl RateSettingAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn list_rate_settings(&self) -> Result<Vec<RateSetting>, Error> {
        self.backend.list_rate_settings().await
    }

    #[tracing::instrument(skip(self))]
    async fn find_rate_setting(&self, id: i64) -> Result<RateSetting, Error> {
        self.backend.find_rate_setting(id).await
    }

    #[tracing::instrument(skip(self))]
    async fn find_active_rate_setting(&self) -> Result<RateSetting, Error> {
        self.backend.find_active_rate_setting().await
    }

    #[tracing::instrument(skip(self))]
    async fn create_rate_setting(&self, params: RateSettingParams) -> Result<RateSetting, Error> {
        validate_rate(&params)?;

        self.backend.create_rate_setting(params).await
    }

    #[tracing::instrument(skip(self))]
    async fn update_rate_setting(
        &self,
        id: i64,
        params: RateSettingParams,
    ) -> Result<RateSetting, Error> {
        validate_rate(&params)?;

        self.backend.update_rate_setting(id, params).await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_rate_setting(&self, id: i64) -> Result<(), Error> {
        self.backend.delete_rate_setting(id).await
    }
}

fn validate_rate(params: &RateSettingParams) -> Result<(), Error> {
    if !params.rate_per_km.is_finite() || params.rate_per_km < 0.0 {
        return Err(invalid_input_error());
    }

    Ok(())
}
