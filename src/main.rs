/// Flight tracker backend entry point
mod clients;
mod config;
mod domain;
mod errors;
mod handlers;
mod routes;
mod services;
mod utils;

use crate::clients::{AviationStackClient, FlightSource};
use crate::config::AppConfig;
use crate::handlers::AppState;
use crate::routes::build_router;
use crate::services::{FlightLookup, HistoryService, SnapshotCache, StatusService, SystemClock};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    // Load configuration
    let config = AppConfig::from_env()?;
    info!("Configuration loaded successfully");

    // Initialize upstream client
    let source: Arc<dyn FlightSource> = Arc::new(
        AviationStackClient::new(
            config.aviationstack_api.clone(),
            config.aviationstack_key.clone(),
            config.timeouts,
        )?,
    );

    // Initialize services
    let snapshot_cache = Arc::new(SnapshotCache::new(
        source.clone(),
        Arc::new(SystemClock),
        config.snapshot_ttl,
    ));
    let lookup = Arc::new(FlightLookup::new(snapshot_cache.clone(), source.clone()));
    let history = Arc::new(HistoryService::new(source.clone()));
    let status = Arc::new(StatusService::new(snapshot_cache.clone(), source));

    // Initialize application state
    let state = AppState {
        snapshot_cache,
        lookup,
        history,
        status,
    };

    // Build router
    let app = build_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Flight tracker backend listening on {}", addr);
    info!("Using AviationStack ({})", config.aviationstack_api);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
