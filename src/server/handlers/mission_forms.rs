use axum::body::Bytes;
use axum::extract::{Extension, Json, Path};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::DynAPI;
use crate::entities::{Coordinates, MissionDetails, MissionForm, MissionOrder};
use crate::error::{invalid_input_error, Error};

#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OpenParams {
    mission_order_id: Option<i64>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginParams {
    unit_id: i64,
}

/// Opens a blank form, or an edit form when `missionOrderId` is given. Only
/// an empty body falls back to a blank form.
pub async fn open(
    Extension(api): Extension<DynAPI>,
    body: Bytes,
) -> Result<Json<MissionForm>, Error> {
    let params: OpenParams = if body.iter().all(u8::is_ascii_whitespace) {
        OpenParams::default()
    } else {
        serde_json::from_slice(&body).map_err(|err| {
            tracing::debug!(error = %err, "malformed open params");
            invalid_input_error()
        })?
    };
    let form = api.open_mission_form(params.mission_order_id).await?;

    Ok(form.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
) -> Result<Json<MissionForm>, Error> {
    let form = api.find_mission_form(id).await?;

    Ok(form.into())
}

pub async fn update_details(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
    Json(details): Json<MissionDetails>,
) -> Result<Json<MissionForm>, Error> {
    let form = api.update_mission_details(id, details).await?;

    Ok(form.into())
}

pub async fn select_origin(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
    Json(params): Json<OriginParams>,
) -> Result<Json<MissionForm>, Error> {
    let form = api.select_origin(id, params.unit_id).await?;

    Ok(form.into())
}

pub async fn add_destination(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
    Json(point): Json<Coordinates>,
) -> Result<Json<MissionForm>, Error> {
    let form = api.add_destination(id, point).await?;

    Ok(form.into())
}

pub async fn remove_destination(
    Extension(api): Extension<DynAPI>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> Result<Json<MissionForm>, Error> {
    let form = api.remove_destination(id, index).await?;

    Ok(form.into())
}

pub async fn submit(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
) -> Result<Json<MissionOrder>, Error> {
    let order = api.submit_mission_form(id).await?;

    Ok(order.into())
}

pub async fn discard(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, Error> {
    api.discard_mission_form(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
