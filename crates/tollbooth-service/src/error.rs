//! API error types and responses.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use tollbooth_core::MeterError;
use tollbooth_store::StoreError;

/// API error type.
///
/// Every variant maps to a stable machine-readable code and an HTTP
/// status; errors cross the API boundary as typed results, never as
/// uncaught panics.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid kind, units, or options.
    #[error("validation error: {0}")]
    Validation(String),

    /// Caller exceeded their request quota.
    #[error("rate limited")]
    RateLimited {
        /// Seconds until the caller's window resets.
        retry_after_secs: u64,
    },

    /// Insufficient credits.
    #[error("insufficient credits: balance={balance}, required={required}")]
    InsufficientCredits {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// Upstream provider kept failing transiently.
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Upstream provider failed permanently.
    #[error("provider failed: {0}")]
    ProviderFailed(String),

    /// Concurrent ledger modification detected.
    #[error("ledger conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                msg.clone(),
                None,
            ),
            Self::RateLimited { retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                format!("rate limited, retry after {retry_after_secs}s"),
                Some(serde_json::json!({ "retry_after_secs": retry_after_secs })),
            ),
            Self::InsufficientCredits { balance, required } => (
                StatusCode::PAYMENT_REQUIRED,
                "insufficient_credits",
                self.to_string(),
                Some(serde_json::json!({
                    "balance": balance,
                    "required": required
                })),
            ),
            Self::ProviderUnavailable(msg) => (
                StatusCode::BAD_GATEWAY,
                "provider_unavailable",
                msg.clone(),
                None,
            ),
            Self::ProviderFailed(msg) => {
                (StatusCode::BAD_GATEWAY, "provider_failed", msg.clone(), None)
            }
            Self::Conflict(msg) => (StatusCode::CONFLICT, "ledger_conflict", msg.clone(), None),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let retry_after = match &self {
            Self::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            response
                .headers_mut()
                .insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
        }
        response
    }
}

impl From<MeterError> for ApiError {
    fn from(err: MeterError) -> Self {
        match err {
            MeterError::Validation(msg) => Self::Validation(msg),
            MeterError::InvalidId(e) => Self::Validation(e.to_string()),
            MeterError::RateLimited { retry_after_secs } => Self::RateLimited { retry_after_secs },
            MeterError::InsufficientCredits { balance, required } => {
                Self::InsufficientCredits { balance, required }
            }
            MeterError::ProviderUnavailable { attempts, message } => {
                Self::ProviderUnavailable(format!("failed after {attempts} attempts: {message}"))
            }
            MeterError::ProviderFailed { message } => Self::ProviderFailed(message),
            MeterError::LedgerConflict(msg) => Self::Conflict(msg),
            MeterError::AccountNotFound { account_id } => {
                Self::NotFound(format!("account not found: {account_id}"))
            }
            MeterError::Storage(msg) => Self::Internal(msg),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AccountNotFound { account_id } => {
                Self::NotFound(format!("account not found: {account_id}"))
            }
            StoreError::InsufficientCredits { balance, required } => {
                Self::InsufficientCredits { balance, required }
            }
            StoreError::Conflict(msg) => Self::Conflict(msg),
            StoreError::InvalidAmount(msg) => Self::Validation(msg),
            StoreError::Database(msg) | StoreError::Serialization(msg) => Self::Internal(msg),
        }
    }
}
