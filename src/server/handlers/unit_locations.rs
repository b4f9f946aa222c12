use axum::extract::{Extension, Json, Path};
use axum::http::StatusCode;

use crate::api::DynAPI;
use crate::entities::{UnitLocation, UnitLocationParams};
use crate::error::Error;

pub async fn list(Extension(api): Extension<DynAPI>) -> Result<Json<Vec<UnitLocation>>, Error> {
    let units = api.list_unit_locations().await?;

    Ok(units.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<i64>,
) -> Result<Json<UnitLocation>, Error> {
    let unit = api.find_unit_location(id).await?;

    Ok(unit.into())
}

pub async fn find_default(Extension(api): Extension<DynAPI>) -> Result<Json<UnitLocation>, Error> {
    let unit = api.find_default_unit_location().await?;

    Ok(unit.into())
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    Json(params): Json<UnitLocationParams>,
) -> Result<Json<UnitLocation>, Error> {
    let unit = api.create_unit_location(params).await?;

    Ok(unit.into())
}

pub async fn update(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<i64>,
    Json(params): Json<UnitLocationParams>,
) -> Result<Json<UnitLocation>, Error> {
    let unit = api.update_unit_location(id, params).await?;

    Ok(unit.into())
}

pub async fn delete(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<i64>,
) -> Result<StatusCode, Error> {
    api.delete_unit_location(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
