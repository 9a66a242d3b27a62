//! Error types for the tollbooth ledger store.

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in ledger storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Concurrent modification detected during commit.
    #[error("ledger conflict: {0}")]
    Conflict(String),

    /// Account not found.
    #[error("account not found: {account_id}")]
    AccountNotFound {
        /// The account ID that was not found.
        account_id: String,
    },

    /// Insufficient credits for a deduction.
    #[error("insufficient credits: balance={balance}, required={required}")]
    InsufficientCredits {
        /// Current balance in credits.
        balance: i64,
        /// Required amount in credits.
        required: i64,
    },

    /// Invalid amount or entry kind for the operation.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}
