//! Tollbooth HTTP API service.
//!
//! This crate exposes the usage-metering core over HTTP:
//!
//! - Cost estimation (side channel, never billed)
//! - Metered execution of AI operations
//! - Balance, ledger history, and usage statistics
//! - Admin credit grants
//!
//! The metered-operation executor lives here: it wires the pricing
//! calculator, rate limiter, credit ledger, and provider retry policy into
//! one state machine per invocation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers need async for routing consistency

pub mod auth;
pub mod config;
pub mod error;
pub mod executor;
pub mod handlers;
pub mod ratelimit;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use executor::{ExecuteRequest, ExecuteReceipt, MeteredExecutor};
pub use routes::create_router;
pub use state::AppState;
