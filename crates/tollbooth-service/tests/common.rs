//! Common test utilities for tollbooth integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum_test::TestServer;
use tempfile::TempDir;

use tollbooth_core::AccountId;
use tollbooth_provider::{Provider, ProviderError, ProviderRequest, ProviderResponse};
use tollbooth_service::{create_router, AppState, ServiceConfig};
use tollbooth_store::RocksLedger;

/// How the mock provider responds to each invocation.
#[derive(Debug, Clone, Copy)]
pub enum ProviderBehavior {
    /// Always succeed with a fixed output.
    Succeed,
    /// Always fail transiently (exhausts the retry policy).
    Transient,
    /// Always fail permanently (no retries).
    Permanent,
}

/// An in-process provider with scripted behavior and a call counter.
pub struct MockProvider {
    calls: AtomicU32,
    behavior: ProviderBehavior,
}

impl MockProvider {
    pub fn new(behavior: ProviderBehavior) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU32::new(0),
            behavior,
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn invoke(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            ProviderBehavior::Succeed => Ok(ProviderResponse {
                output: serde_json::json!({
                    "kind": request.kind.as_str(),
                    "result": "ok"
                }),
            }),
            ProviderBehavior::Transient => Err(ProviderError::transient("upstream 503")),
            ProviderBehavior::Permanent => Err(ProviderError::permanent("upstream 400")),
        }
    }
}

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The mock provider behind the executor.
    pub provider: Arc<MockProvider>,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// The service API key for authenticated requests.
    pub service_api_key: String,
}

impl TestHarness {
    /// Create a new test harness with a fresh database and a provider that
    /// always succeeds.
    pub fn new() -> Self {
        Self::with_behavior(ProviderBehavior::Succeed)
    }

    /// Create a harness with the given provider behavior.
    pub fn with_behavior(behavior: ProviderBehavior) -> Self {
        Self::build(behavior, test_config)
    }

    /// Create a harness with a customized configuration.
    pub fn with_config(
        behavior: ProviderBehavior,
        customize: impl FnOnce(&mut ServiceConfig),
    ) -> Self {
        Self::build(behavior, |data_dir| {
            let mut config = test_config(data_dir);
            customize(&mut config);
            config
        })
    }

    fn build(
        behavior: ProviderBehavior,
        make_config: impl FnOnce(String) -> ServiceConfig,
    ) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let ledger = RocksLedger::open(temp_dir.path()).expect("Failed to open ledger");

        let config = make_config(temp_dir.path().to_string_lossy().to_string());
        let service_api_key = config
            .service_api_key
            .clone()
            .expect("test config always sets a service API key");

        let provider = MockProvider::new(behavior);
        let state = AppState::new(Arc::new(ledger), Arc::clone(&provider) as _, config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            provider,
            _temp_dir: temp_dir,
            service_api_key,
        }
    }

    /// Grant credits to a fresh account and return its id.
    pub async fn seeded_account(&self, credits: i64) -> AccountId {
        let account_id = AccountId::generate();
        self.server
            .post(&format!("/v1/accounts/{account_id}/credits"))
            .add_header("x-api-key", self.service_api_key.clone())
            .json(&serde_json::json!({ "amount_credits": credits }))
            .await
            .assert_status_ok();
        account_id
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

fn test_config(data_dir: String) -> ServiceConfig {
    ServiceConfig {
        listen_addr: "127.0.0.1:0".into(),
        data_dir,
        service_api_key: Some("test-service-key".to_string()),
        // High enough that tests exercising other behavior never trip it.
        rate_limit: tollbooth_limiter::RateLimitConfig {
            window: Duration::from_secs(60),
            limit: 1000,
        },
        retry: tollbooth_provider::RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            attempt_timeout: Duration::from_secs(5),
        },
        ..ServiceConfig::default()
    }
}
