//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{accounts, health, meter};
use crate::ratelimit;
use crate::state::AppState;

/// Maximum concurrent requests for the execute endpoint, which holds a
/// provider connection for the duration of each call.
const EXECUTE_MAX_CONCURRENT_REQUESTS: usize = 100;

/// Maximum concurrent requests for read-side API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Metering
/// - `POST /v1/estimate` - Price quote without execution
/// - `POST /v1/execute` - Metered operation (Service API Key auth)
///
/// ## Accounts
/// - `GET /v1/accounts/:id/balance` - Current balance
/// - `POST /v1/accounts/:id/credits` - Grant credits (Service API Key auth)
/// - `GET /v1/accounts/:id/history` - Ledger history, newest first
/// - `GET /v1/accounts/:id/usage` - Usage aggregated over trailing days
///
/// The execute route carries its own rate check keyed by operation kind
/// inside the executor; every other `/v1` route goes through the
/// path-keyed rate limiting middleware.
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let execute_routes = Router::new()
        .route("/execute", post(meter::execute))
        .layer(ConcurrencyLimitLayer::new(EXECUTE_MAX_CONCURRENT_REQUESTS));

    let api_routes = Router::new()
        .route("/estimate", post(meter::estimate))
        .route("/accounts/:id/balance", get(accounts::get_balance))
        .route("/accounts/:id/credits", post(accounts::grant_credits))
        .route("/accounts/:id/history", get(accounts::history))
        .route("/accounts/:id/usage", get(accounts::usage))
        .layer(from_fn_with_state(Arc::clone(&state), ratelimit::enforce))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        .nest("/v1", api_routes.merge(execute_routes))
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
