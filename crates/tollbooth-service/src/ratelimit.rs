//! Per-caller rate limiting middleware.
//!
//! Applies the fixed-window limiter to read-side routes, keyed by the
//! caller's IP (from forwarding headers) and the request path. The
//! `/v1/execute` route is not covered here; the executor runs its own
//! check keyed by operation kind so a denial there never consumes a
//! ledger read.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use tollbooth_limiter::{derive_caller_key, RateLimitDecision};

use crate::error::ApiError;
use crate::state::AppState;

/// Axum middleware enforcing the per-caller fixed window.
pub async fn enforce(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let caller_key = caller_key_from_request(&request);
    let route_key = request.uri().path().to_string();

    let decision = state.windows.check(
        &caller_key,
        &route_key,
        &state.config.rate_limit,
        Instant::now(),
    );

    if !decision.allowed {
        tracing::debug!(caller = %caller_key, route = %route_key, "rate limit exceeded");
        return ApiError::RateLimited {
            retry_after_secs: decision.retry_after_secs(),
        }
        .into_response();
    }

    let mut response = next.run(request).await;
    attach_rate_headers(&mut response, state.config.rate_limit.limit, &decision);
    response
}

fn caller_key_from_request(request: &Request<Body>) -> String {
    let header = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
    };
    derive_caller_key(header("x-forwarded-for"), header("x-real-ip"))
}

/// Attach `X-RateLimit-*` headers describing the caller's window state.
pub fn attach_rate_headers(response: &mut Response, limit: u32, decision: &RateLimitDecision) {
    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", int_header(u64::from(limit)));
    headers.insert("x-ratelimit-remaining", int_header(u64::from(decision.remaining)));
    headers.insert("x-ratelimit-reset", int_header(decision.reset_secs()));
}

fn int_header(value: u64) -> HeaderValue {
    HeaderValue::from_str(&value.to_string())
        .unwrap_or_else(|_| HeaderValue::from_static("0"))
}
