//! Application state.

use std::sync::Arc;

use tollbooth_limiter::{MemoryWindowStore, WindowStore};
use tollbooth_provider::Provider;
use tollbooth_store::Ledger;

use crate::config::ServiceConfig;
use crate::executor::MeteredExecutor;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The credit ledger.
    pub ledger: Arc<dyn Ledger>,

    /// Shared rate-limit window store.
    pub windows: Arc<dyn WindowStore>,

    /// The metered-operation executor.
    pub executor: MeteredExecutor,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        ledger: Arc<dyn Ledger>,
        provider: Arc<dyn Provider>,
        config: ServiceConfig,
    ) -> Self {
        if config.service_api_key.is_none() {
            tracing::warn!("SERVICE_API_KEY not configured - mutating endpoints will reject all requests");
        }

        let windows: Arc<dyn WindowStore> = Arc::new(MemoryWindowStore::new());

        let executor = MeteredExecutor::new(
            Arc::clone(&ledger),
            Arc::clone(&provider),
            Arc::clone(&windows),
            config.pricing.clone(),
            config.rate_limit,
            config.retry,
        );

        Self {
            ledger,
            windows,
            executor,
            config,
        }
    }
}
