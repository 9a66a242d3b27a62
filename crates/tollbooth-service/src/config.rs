//! Service configuration.

use std::time::Duration;

use tollbooth_core::PricingConfig;
use tollbooth_limiter::RateLimitConfig;
use tollbooth_provider::RetryPolicy;

/// Service configuration loaded from environment variables.
///
/// Everything here is static: pricing rates, rate-limit windows, and the
/// retry policy are fixed at startup and never renegotiated at runtime.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to the ledger data directory (default: "/data/tollbooth").
    pub data_dir: String,

    /// Service API key for mutating endpoints.
    pub service_api_key: Option<String>,

    /// Base URL of the upstream AI provider.
    pub provider_base_url: String,

    /// API key for the upstream AI provider.
    pub provider_api_key: Option<String>,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Per-route rate limit configuration.
    pub rate_limit: RateLimitConfig,

    /// Provider retry policy.
    pub retry: RetryPolicy,

    /// Pricing configuration.
    pub pricing: PricingConfig,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let rate_limit = RateLimitConfig {
            window: env_parse("RATE_LIMIT_WINDOW_MS")
                .map_or(defaults.rate_limit.window, Duration::from_millis),
            limit: env_parse("RATE_LIMIT_MAX_REQUESTS").unwrap_or(defaults.rate_limit.limit),
        };

        let retry = RetryPolicy {
            max_attempts: env_parse("RETRY_MAX_ATTEMPTS").unwrap_or(defaults.retry.max_attempts),
            base_delay: env_parse("RETRY_BASE_DELAY_MS")
                .map_or(defaults.retry.base_delay, Duration::from_millis),
            attempt_timeout: env_parse("PROVIDER_TIMEOUT_SECONDS")
                .map_or(defaults.retry.attempt_timeout, Duration::from_secs),
        };

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            data_dir: std::env::var("DATA_DIR").unwrap_or(defaults.data_dir),
            service_api_key: std::env::var("SERVICE_API_KEY").ok(),
            provider_base_url: std::env::var("PROVIDER_BASE_URL")
                .unwrap_or(defaults.provider_base_url),
            provider_api_key: std::env::var("PROVIDER_API_KEY").ok(),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: env_parse("MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
            request_timeout_seconds: env_parse("REQUEST_TIMEOUT_SECONDS")
                .unwrap_or(defaults.request_timeout_seconds),
            rate_limit,
            retry,
            pricing: PricingConfig::default(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/tollbooth".into(),
            service_api_key: None,
            provider_base_url: "http://localhost:9900".into(),
            provider_api_key: None,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            rate_limit: RateLimitConfig::default(),
            retry: RetryPolicy::default(),
            pricing: PricingConfig::default(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}
