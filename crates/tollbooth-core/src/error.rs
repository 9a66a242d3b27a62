//! Error taxonomy for tollbooth operations.
//!
//! Every failure that can cross the public contract boundary is a variant
//! here, carried as a typed result. Each variant has a stable string code
//! that the API layer exposes to callers.

use crate::ids::IdError;

/// Result type for tollbooth operations.
pub type Result<T> = std::result::Result<T, MeterError>;

/// Errors that can occur while metering an operation.
#[derive(Debug, thiserror::Error)]
pub enum MeterError {
    /// Bad operation kind, units, or options. Never retried, never billed.
    #[error("validation error: {0}")]
    Validation(String),

    /// The caller exceeded their request quota. Never billed.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until the caller's window resets.
        retry_after_secs: u64,
    },

    /// The account balance cannot cover the operation. Never billed.
    #[error("insufficient credits: balance={balance}, required={required}")]
    InsufficientCredits {
        /// Current balance in credits.
        balance: i64,
        /// Required amount in credits.
        required: i64,
    },

    /// The upstream provider kept failing transiently until retries ran out.
    #[error("provider unavailable after {attempts} attempts: {message}")]
    ProviderUnavailable {
        /// How many attempts were made.
        attempts: u32,
        /// The last transient error observed.
        message: String,
    },

    /// The upstream provider failed permanently. Surfaced immediately,
    /// never retried, never billed.
    #[error("provider failed: {message}")]
    ProviderFailed {
        /// The provider's error message.
        message: String,
    },

    /// Concurrent modification detected while committing to the ledger.
    #[error("ledger conflict: {0}")]
    LedgerConflict(String),

    /// Account not found.
    #[error("account not found: {account_id}")]
    AccountNotFound {
        /// The account ID that was not found.
        account_id: String,
    },

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}

impl MeterError {
    /// Stable machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::InvalidId(_) => "validation_error",
            Self::RateLimited { .. } => "rate_limited",
            Self::InsufficientCredits { .. } => "insufficient_credits",
            Self::ProviderUnavailable { .. } => "provider_unavailable",
            Self::ProviderFailed { .. } => "provider_failed",
            Self::LedgerConflict(_) => "ledger_conflict",
            Self::AccountNotFound { .. } => "account_not_found",
            Self::Storage(_) => "storage_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(MeterError::Validation("bad".into()).code(), "validation_error");
        assert_eq!(
            MeterError::RateLimited { retry_after_secs: 3 }.code(),
            "rate_limited"
        );
        assert_eq!(
            MeterError::InsufficientCredits {
                balance: 1,
                required: 2
            }
            .code(),
            "insufficient_credits"
        );
        assert_eq!(
            MeterError::ProviderUnavailable {
                attempts: 3,
                message: "timeout".into()
            }
            .code(),
            "provider_unavailable"
        );
    }
}
