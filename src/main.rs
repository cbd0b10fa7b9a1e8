// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use anyhow::Context;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::billing_service::BillingService;
use crate::application::clock::SystemClock;
use crate::application::tank_service::TankService;
use crate::infrastructure::config::{load_app_config, load_influx_config};
use crate::infrastructure::influx_repository::InfluxRepository;
use crate::presentation::app_state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tank_telemetry=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Load configuration
    let influx_config = load_influx_config().context("Failed to load config/influx")?;
    let app_config = load_app_config().context("Failed to load config/app")?;
    let aggregator = Arc::new(app_config.aggregator()?);
    let catalog = app_config.catalog()?;
    tracing::info!(
        "Billing {} per 1000 units refilled (refill at {}%), day keys '{}' in {}",
        aggregator.policy().unit_price,
        aggregator.policy().refill_threshold,
        aggregator.day_keys().pattern(),
        aggregator.day_keys().timezone()
    );

    // Create repository (infrastructure layer)
    let repository = Arc::new(InfluxRepository::new(influx_config.influx));

    // Create services (application layer)
    let tank_service = TankService::new(repository.clone(), catalog.clone());
    let billing_service =
        BillingService::new(repository, aggregator, catalog, Arc::new(SystemClock));

    let state = Arc::new(AppState {
        tank_service,
        billing_service,
    });

    // Build router (presentation layer)
    let router = presentation::router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = app_config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid bind address {}", app_config.server.bind_addr))?;
    tracing::info!("Starting tank-telemetry service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
