//! Bounded retry with exponential backoff.

use std::time::Duration;

use crate::{Provider, ProviderError, ProviderRequest, ProviderResponse};

/// Retry policy for provider calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,

    /// Backoff before retry `n` is `base_delay * 2^(n-1)`.
    pub base_delay: Duration,

    /// Timeout applied to each attempt independently.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            attempt_timeout: Duration::from_secs(30),
        }
    }
}

/// Invoke a provider under a retry policy.
///
/// Transient errors (including per-attempt timeouts) are retried with
/// exponential backoff up to `max_attempts` total attempts; permanent
/// errors return immediately. The returned future is cancellable at every
/// await point, so a disconnected caller aborts the outstanding attempt.
///
/// # Errors
///
/// Returns the permanent error as-is, or the last transient error once
/// attempts are exhausted.
pub async fn invoke_with_retry(
    provider: &dyn Provider,
    request: &ProviderRequest,
    policy: &RetryPolicy,
) -> Result<ProviderResponse, ProviderError> {
    let mut last_error = ProviderError::transient("no attempts were made");

    for attempt in 0..policy.max_attempts {
        if attempt > 0 {
            let delay = policy.base_delay * 2u32.saturating_pow(attempt - 1);
            tracing::debug!(
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                kind = request.kind.as_str(),
                "backing off before provider retry"
            );
            tokio::time::sleep(delay).await;
        }

        match tokio::time::timeout(policy.attempt_timeout, provider.invoke(request)).await {
            Ok(Ok(response)) => return Ok(response),
            Ok(Err(err)) if err.is_transient() => {
                tracing::warn!(
                    attempt,
                    error = %err,
                    kind = request.kind.as_str(),
                    "transient provider failure"
                );
                last_error = err;
            }
            Ok(Err(err)) => return Err(err),
            Err(_elapsed) => {
                tracing::warn!(
                    attempt,
                    timeout_ms = u64::try_from(policy.attempt_timeout.as_millis())
                        .unwrap_or(u64::MAX),
                    kind = request.kind.as_str(),
                    "provider attempt timed out"
                );
                last_error = ProviderError::transient("attempt timed out");
            }
        }
    }

    Err(last_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tollbooth_core::OperationKind;

    struct FlakyProvider {
        calls: AtomicU32,
        succeed_on: Option<u32>,
        permanent: bool,
    }

    impl FlakyProvider {
        fn always_transient() -> Self {
            Self {
                calls: AtomicU32::new(0),
                succeed_on: None,
                permanent: false,
            }
        }

        fn succeeds_on(attempt: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                succeed_on: Some(attempt),
                permanent: false,
            }
        }

        fn always_permanent() -> Self {
            Self {
                calls: AtomicU32::new(0),
                succeed_on: None,
                permanent: true,
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Provider for FlakyProvider {
        async fn invoke(
            &self,
            _request: &ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

            if self.permanent {
                return Err(ProviderError::permanent("bad request"));
            }
            if Some(call) == self.succeed_on {
                return Ok(ProviderResponse {
                    output: serde_json::json!({ "ok": call }),
                });
            }
            Err(ProviderError::transient("upstream 503"))
        }
    }

    fn request() -> ProviderRequest {
        ProviderRequest {
            kind: OperationKind::Translate,
            units: 1000.0,
            options: None,
            payload: serde_json::json!({ "text": "hello" }),
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(10),
            attempt_timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_exhaust_exactly_max_attempts() {
        let provider = FlakyProvider::always_transient();

        let err = invoke_with_retry(&provider, &request(), &policy())
            .await
            .unwrap_err();

        assert_eq!(provider.calls(), 3);
        assert!(err.is_transient());
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_error_is_not_retried() {
        let provider = FlakyProvider::always_permanent();

        let err = invoke_with_retry(&provider, &request(), &policy())
            .await
            .unwrap_err();

        assert_eq!(provider.calls(), 1);
        assert!(!err.is_transient());
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_failures() {
        let provider = FlakyProvider::succeeds_on(3);

        let response = invoke_with_retry(&provider, &request(), &policy())
            .await
            .unwrap();

        assert_eq!(provider.calls(), 3);
        assert_eq!(response.output["ok"], 3);
    }

    #[tokio::test(start_paused = true)]
    async fn first_attempt_success_makes_one_call() {
        let provider = FlakyProvider::succeeds_on(1);

        invoke_with_retry(&provider, &request(), &policy())
            .await
            .unwrap();

        assert_eq!(provider.calls(), 1);
    }
}
