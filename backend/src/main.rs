//! Service entry-point: loads settings, prepares the database and serves the
//! harbor ingestion API.

mod server;

use std::io;
use std::sync::Arc;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use harbor_service::config::HarborSettings;
use harbor_service::inbound::http::HealthState;
use harbor_service::outbound::persistence::{
    DbPool, DieselHarborRepository, PoolConfig, run_pending_migrations,
};
use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = HarborSettings::load_from_iter(std::env::args_os())
        .map_err(|e| io::Error::other(e.to_string()))?;
    let database_url = settings.database_url().map_err(io::Error::other)?;
    let bind_addr = settings.bind_addr().map_err(io::Error::other)?;

    if settings.run_migrations() {
        let url = database_url.clone();
        let applied = web::block(move || run_pending_migrations(&url))
            .await
            .map_err(|e| io::Error::other(e.to_string()))?
            .map_err(io::Error::other)?;
        info!(applied, "database migrations complete");
    }

    let pool = DbPool::new(PoolConfig::new(database_url).with_max_size(settings.pool_max_size()))
        .await
        .map_err(io::Error::other)?;
    let harbors = Arc::new(DieselHarborRepository::new(pool));

    let health_state = web::Data::new(HealthState::new());
    let config =
        ServerConfig::new(bind_addr, harbors).with_shutdown_timeout(settings.shutdown_timeout());
    info!(%bind_addr, "harbor service listening");
    let result = create_server(health_state.clone(), config)?.await;
    health_state.mark_unhealthy();
    result
}
