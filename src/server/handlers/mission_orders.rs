use axum::extract::{Extension, Json, Path};
use axum::http::StatusCode;

use crate::api::DynAPI;
use crate::entities::MissionOrder;
use crate::error::Error;

pub async fn list(Extension(api): Extension<DynAPI>) -> Result<Json<Vec<MissionOrder>>, Error> {
    let orders = api.list_mission_orders().await?;

    Ok(orders.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<i64>,
) -> Result<Json<MissionOrder>, Error> {
    let order = api.find_mission_order(id).await?;

    Ok(order.into())
}

pub async fn delete(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<i64>,
) -> Result<StatusCode, Error> {
    api.delete_mission_order(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
