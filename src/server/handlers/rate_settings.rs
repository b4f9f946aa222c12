use axum::extract::{Extension, Json, Path};
use axum::http::StatusCode;

use crate::api::DynAPI;
use crate::entities::{RateSetting, RateSettingParams};
use crate::error::Error;

pub async fn list(Extension(api): Extension<DynAPI>) -> Result<Json<Vec<RateSetting>>, Error> {
    let settings = api.list_rate_settings().await?;

    Ok(settings.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<i64>,
) -> Result<Json<RateSetting>, Error> {
    let setting = api.find_rate_setting(id).await?;

    Ok(setting.into())
}

pub async fn find_active(Extension(api): Extension<DynAPI>) -> Result<Json<RateSetting>, Error> {
    let setting = api.find_active_rate_setting().await?;

    Ok(setting.into())
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    Json(params): Json<RateSettingParams>,
) -> Result<Json<RateSetting>, Error> {
    let setting = api.create_rate_setting(params).await?;

    Ok(setting.into())
}

pub async fn update(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<i64>,
    Json(params): Json<RateSettingParams>,
) -> Result<Json<RateSetting>, Error> {
    let setting = api.update_rate_setting(id, params).await?;

    Ok(setting.into())
}

pub async fn delete(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<i64>,
) -> Result<StatusCode, Error> {
    api.delete_rate_setting(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
