//! Estimate and execute handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use tollbooth_core::{AccountId, OperationKind, OperationOptions, PriceQuote};
use tollbooth_limiter::derive_caller_key;

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::executor::ExecuteRequest;
use crate::ratelimit::attach_rate_headers;
use crate::state::AppState;

/// Estimate request body.
#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    /// The operation kind.
    pub kind: OperationKind,
    /// Usage units (words, seconds, characters).
    pub units: f64,
    /// Kind-specific options.
    #[serde(default)]
    pub options: Option<OperationOptions>,
}

/// Estimate response.
#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    /// The operation kind echoed back.
    pub kind: OperationKind,
    /// The price quote.
    pub quote: PriceQuote,
}

/// Compute a price quote without executing anything.
pub async fn estimate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EstimateRequest>,
) -> Result<Json<EstimateResponse>, ApiError> {
    let quote = state
        .executor
        .estimate(body.kind, body.units, body.options.as_ref())?;

    Ok(Json(EstimateResponse {
        kind: body.kind,
        quote,
    }))
}

/// Execute request body.
#[derive(Debug, Deserialize)]
pub struct ExecuteBody {
    /// The account to charge.
    pub account_id: AccountId,
    /// The operation kind.
    pub kind: OperationKind,
    /// Usage units.
    pub units: f64,
    /// Kind-specific options.
    #[serde(default)]
    pub options: Option<OperationOptions>,
    /// The operation payload, forwarded to the provider.
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Execute response.
#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    /// The provider's output.
    pub output: serde_json::Value,
    /// The quote that was charged.
    pub quote: PriceQuote,
    /// Balance after the debit.
    pub new_balance_credits: i64,
    /// The appended usage ledger entry.
    pub entry_id: String,
}

/// Execute a metered operation: price, rate-check, pre-check the balance,
/// invoke the provider under the retry policy, debit, release the output.
pub async fn execute(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    headers: HeaderMap,
    Json(body): Json<ExecuteBody>,
) -> Result<Response, ApiError> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let caller_key = derive_caller_key(header("x-forwarded-for"), header("x-real-ip"));

    let receipt = state
        .executor
        .execute(
            &caller_key,
            ExecuteRequest {
                account_id: body.account_id,
                kind: body.kind,
                units: body.units,
                options: body.options,
                payload: body.payload,
            },
        )
        .await?;

    let mut response = Json(ExecuteResponse {
        output: receipt.output,
        quote: receipt.quote,
        new_balance_credits: receipt.new_balance_credits,
        entry_id: receipt.entry_id.to_string(),
    })
    .into_response();
    attach_rate_headers(
        &mut response,
        state.config.rate_limit.limit,
        &receipt.rate,
    );
    Ok(response)
}
