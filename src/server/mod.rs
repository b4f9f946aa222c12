mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, post, put},
    Router,
};

use crate::api::{DynAPI, API};
use crate::error::{unexpected_error, Error};
use crate::server::handlers::{mission_forms, mission_orders, rate_settings, unit_locations};

pub fn router(api: DynAPI) -> Router {
    Router::new()
        .route(
            "/unit-locations",
            get(unit_locations::list).post(unit_locations::create),
        )
        .route(
            "/unit-locations/:id",
            get(unit_locations::find)
                .put(unit_locations::update)
                .delete(unit_locations::delete),
        )
        .route("/default-unit-location", get(unit_locations::find_default))
        .route(
            "/rate-settings",
            get(rate_settings::list).post(rate_settings::create),
        )
        .route(
            "/rate-settings/:id",
            get(rate_settings::find)
                .put(rate_settings::update)
                .delete(rate_settings::delete),
        )
        .route("/active-rate-setting", get(rate_settings::find_active))
        .route("/mission-orders", get(mission_orders::list))
        .route(
            "/mission-orders/:id",
            get(mission_orders::find).delete(mission_orders::delete),
        )
        .route("/mission-forms", post(mission_forms::open))
        .route(
            "/mission-forms/:id",
            get(mission_forms::find)
                .patch(mission_forms::update_details)
                .delete(mission_forms::discard),
        )
        .route("/mission-forms/:id/origin", put(mission_forms::select_origin))
        .route(
            "/mission-forms/:id/destinations",
            post(mission_forms::add_destination),
        )
        .route(
            "/mission-forms/:id/destinations/:index",
            axum::routing::delete(mission_forms::remove_destination),
        )
        .route("/mission-forms/:id/submit", post(mission_forms::submit))
        .layer(Extension(api))
}

pub async fn serve<T: API + Sync + Send + 'static>(api: T, addr: SocketAddr) -> Result<(), Error> {
    let app = router(Arc::new(api) as DynAPI);

    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "server stopped");
            unexpected_error()
        })
}
