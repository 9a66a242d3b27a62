//! Upstream AI provider abstraction for tollbooth.
//!
//! A [`Provider`] executes one AI operation and returns either a result or
//! an error classified as transient or permanent. That classification is
//! the contract the metering core relies on to decide retry eligibility:
//! transient failures are retried with exponential backoff by
//! [`retry::invoke_with_retry`], permanent failures surface immediately.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod http;
pub mod retry;

pub use error::ProviderError;
pub use http::HttpProvider;
pub use retry::{invoke_with_retry, RetryPolicy};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use tollbooth_core::{OperationKind, OperationOptions};

/// A request to execute one AI operation upstream.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderRequest {
    /// The operation kind; selects the upstream endpoint.
    pub kind: OperationKind,

    /// Usage units (words, seconds, characters) for the operation.
    pub units: f64,

    /// Kind-specific options, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OperationOptions>,

    /// The operation payload (text, audio reference, prompt, etc.).
    pub payload: serde_json::Value,
}

/// A successful provider result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The produced output, opaque to the metering core.
    pub output: serde_json::Value,
}

/// An upstream AI provider.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Execute one operation upstream.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] classified as transient or permanent.
    async fn invoke(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError>;
}
