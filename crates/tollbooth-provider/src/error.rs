//! Provider error classification.

/// An error from an upstream AI provider.
///
/// The transient/permanent split determines retry eligibility: upstream
/// rate limiting, timeouts, 5xx responses, and network failures are
/// transient; bad requests, auth failures, and exhausted upstream quotas
/// are permanent.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// A failure worth retrying.
    #[error("transient provider error: {message}")]
    Transient {
        /// What went wrong.
        message: String,
    },

    /// A failure that retrying cannot fix.
    #[error("permanent provider error: {message}")]
    Permanent {
        /// What went wrong.
        message: String,
    },
}

impl ProviderError {
    /// Construct a transient error.
    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    /// Construct a permanent error.
    #[must_use]
    pub fn permanent(message: impl Into<String>) -> Self {
        Self::Permanent {
            message: message.into(),
        }
    }

    /// Whether a retry might succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// The underlying message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Transient { message } | Self::Permanent { message } => message,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        // Network-level failures and timeouts are transient; anything the
        // client itself got wrong (builder, body) is not.
        if err.is_timeout() || err.is_connect() || err.is_request() {
            Self::transient(err.to_string())
        } else {
            Self::permanent(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(ProviderError::transient("upstream 503").is_transient());
        assert!(!ProviderError::permanent("bad request").is_transient());
    }
}
