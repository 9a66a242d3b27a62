//! HTTP provider implementation.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::{Provider, ProviderError, ProviderRequest, ProviderResponse};

/// A provider reached over HTTP.
///
/// Each operation kind maps to its own endpoint under the configured base
/// URL. Response status codes are mapped onto the transient/permanent
/// classification the retry policy depends on.
#[derive(Clone)]
pub struct HttpProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpProvider {
    /// Create a new HTTP provider.
    ///
    /// # Errors
    ///
    /// Returns a permanent error if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn endpoint(&self, request: &ProviderRequest) -> String {
        format!("{}/v1/{}", self.base_url, request.kind.as_str())
    }
}

#[async_trait]
impl Provider for HttpProvider {
    async fn invoke(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut builder = self.client.post(self.endpoint(request)).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            return response
                .json::<ProviderResponse>()
                .await
                .map_err(|e| ProviderError::permanent(format!("malformed provider response: {e}")));
        }

        let body = response.text().await.unwrap_or_default();
        let message = format!("provider returned {status}: {body}");

        let err = match status {
            StatusCode::TOO_MANY_REQUESTS | StatusCode::REQUEST_TIMEOUT => {
                ProviderError::transient(message)
            }
            s if s.is_server_error() => ProviderError::transient(message),
            _ => ProviderError::permanent(message),
        };

        tracing::warn!(
            kind = request.kind.as_str(),
            status = %status,
            transient = err.is_transient(),
            "provider call failed"
        );

        Err(err)
    }
}
