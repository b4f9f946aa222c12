use tracing_subscriber::EnvFilter;

use missiondesk::config::Config;
use missiondesk::engine::Engine;
use missiondesk::error::Error;
use missiondesk::external::{BackendClient, Nominatim, Osrm};
use missiondesk::server::serve;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let engine = Engine::new(
        BackendClient::new(&config.api_base, config.rate_setting_id),
        Osrm::new(&config.routing_api_base),
        Nominatim::new(&config.geocoding_api_base)?,
    );

    engine.spawn_form_sweeper(config.form_idle_timeout);

    let events = engine.events();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            tracing::info!(form_id = %event.form_id(), event = ?event, "{}", event.name());
        }
    });

    serve(engine, config.listen_addr).await
}
