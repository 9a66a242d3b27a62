//! Tollbooth Service - HTTP API for usage metering and credit accounting.
//!
//! This is the main entry point for the tollbooth service.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tollbooth_provider::HttpProvider;
use tollbooth_service::{create_router, AppState, ServiceConfig};
use tollbooth_store::RocksLedger;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tollbooth=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Tollbooth Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        data_dir = %config.data_dir,
        provider_base_url = %config.provider_base_url,
        auth_configured = %config.service_api_key.is_some(),
        "Service configuration loaded"
    );

    // Open the durable credit ledger
    tracing::info!(path = %config.data_dir, "Opening RocksDB ledger");
    let ledger = Arc::new(RocksLedger::open(&config.data_dir)?);

    // Provider client; per-attempt timeouts are enforced by the retry
    // policy, so give reqwest a slightly larger outer bound.
    let provider = Arc::new(HttpProvider::new(
        config.provider_base_url.clone(),
        config.provider_api_key.clone(),
        config.retry.attempt_timeout + Duration::from_secs(5),
    )?);

    // Build app state
    let state = AppState::new(ledger, provider, config.clone());

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
