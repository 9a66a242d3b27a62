//! Authentication extractors.
//!
//! End-user identity is owned by the surrounding platform; this service
//! only carries service-to-service authentication via a shared API key for
//! its mutating endpoints.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;
use crate::state::AppState;

/// Service authentication via the `X-API-Key` header.
#[derive(Debug, Clone)]
pub struct ServiceAuth;

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for ServiceAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let api_key = parts
            .headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let expected = state
            .config
            .service_api_key
            .as_ref()
            .ok_or(ApiError::Unauthorized)?;

        if api_key != expected {
            tracing::debug!("rejected request with invalid service API key");
            return Err(ApiError::Unauthorized);
        }

        Ok(Self)
    }
}
