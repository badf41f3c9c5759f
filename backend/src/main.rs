//! Carpool API server entry-point.

mod server;

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use backend::inbound::http::health::HealthState;
use backend::inbound::http::session_config::{BuildMode, session_settings_from_env};
use backend::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use backend::outbound::storage::LocalFileStore;
use backend::settings::BackendSettings;

use server::{Adapters, ServerConfig, StateOptions, build_http_state, build_maps_source, create_server};

fn io_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(format!("{context}: {err}"))
}

async fn build_adapters(settings: &BackendSettings) -> std::io::Result<Adapters> {
    let maps = build_maps_source(settings)?;
    let Some(database_url) = settings.database_url() else {
        warn!("no database URL configured; using the in-memory store");
        return Ok(Adapters::in_memory(maps));
    };

    let applied = run_pending_migrations(database_url)
        .await
        .map_err(|err| io_error("database migrations failed", err))?;
    info!(applied, "database migrations complete");

    let pool = DbPool::new(PoolConfig::new(database_url))
        .await
        .map_err(|err| io_error("database pool construction failed", err))?;
    let upload_dir = settings.upload_dir();
    let store = LocalFileStore::open(&upload_dir)
        .map_err(|err| io_error(&format!("upload directory {}", upload_dir.display()), err))?;
    Ok(Adapters::postgres(&pool, store, maps))
}

#[cfg(feature = "example-data")]
async fn seed_example_data(adapters: &Adapters) -> std::io::Result<()> {
    use backend::example_data::{ExampleDataSettings, SeedTargets, seed_example_data_on_startup};

    let settings = ExampleDataSettings::load_from_iter(std::env::args_os()).map_err(|err| io_error("example data settings", err))?;
    let targets = SeedTargets {
        users: Arc::clone(&adapters.users),
        vehicles: Arc::clone(&adapters.vehicles),
        routes: Arc::clone(&adapters.routes),
    };
    seed_example_data_on_startup(&settings, &targets)
        .await
        .map_err(|err| io_error("example data seeding failed", err))?;
    Ok(())
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = BackendSettings::load_from_iter(std::env::args_os()).map_err(|err| io_error("backend settings", err))?;
    let bind_addr = settings
        .bind_addr()
        .map_err(|err| io_error("backend settings", err))?;
    let max_upload_bytes = settings
        .max_upload_bytes()
        .map_err(|err| io_error("backend settings", err))?;

    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .map_err(|err| io_error("session configuration", err))?;
    info!(fingerprint = %session.fingerprint(), "session signing key loaded");

    let adapters = build_adapters(&settings).await?;
    #[cfg(feature = "example-data")]
    seed_example_data(&adapters).await?;

    let http_state = build_http_state(
        &adapters,
        &StateOptions {
            max_upload_bytes,
            gateway_secret: settings.gateway_secret(),
        },
    );

    let config = ServerConfig::new(session, bind_addr, http_state);
    #[cfg(feature = "metrics")]
    let config = config.with_metrics(Some(server::prometheus_metrics()?));

    let health_state = web::Data::new(HealthState::new());
    info!(%bind_addr, "carpool backend listening");
    create_server(health_state, config)?.await
}
