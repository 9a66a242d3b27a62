//! The metered-operation executor.
//!
//! One invocation walks: price estimate → rate check → balance pre-check →
//! provider call under the retry policy → ledger debit → result release.
//! A committed debit is a precondition for releasing the provider's output;
//! if the debit fails after a successful provider call the output is
//! discarded. If the provider fails, no debit ever happened and no money
//! moved.

use std::sync::Arc;
use std::time::Instant;

use tollbooth_core::{
    AccountId, EntryId, MeterError, OperationKind, OperationOptions, PriceQuote, PricingConfig,
};
use tollbooth_limiter::{RateLimitConfig, RateLimitDecision, WindowStore};
use tollbooth_provider::{invoke_with_retry, Provider, ProviderRequest, RetryPolicy};
use tollbooth_store::{DebitRequest, Ledger, StoreError};

/// A metered execution request.
#[derive(Debug, Clone)]
pub struct ExecuteRequest {
    /// The account to charge.
    pub account_id: AccountId,
    /// The operation kind.
    pub kind: OperationKind,
    /// Usage units (words, seconds, characters).
    pub units: f64,
    /// Kind-specific options.
    pub options: Option<OperationOptions>,
    /// The operation payload, forwarded to the provider.
    pub payload: serde_json::Value,
}

/// The result of a committed metered operation.
#[derive(Debug, Clone)]
pub struct ExecuteReceipt {
    /// The provider's output.
    pub output: serde_json::Value,
    /// The quote the account was charged against.
    pub quote: PriceQuote,
    /// Balance after the debit.
    pub new_balance_credits: i64,
    /// The usage ledger entry.
    pub entry_id: EntryId,
    /// The caller's rate-limit state after this request.
    pub rate: RateLimitDecision,
}

/// Orchestrates pricing, rate limiting, the credit ledger, and the
/// provider retry policy for each metered invocation.
#[derive(Clone)]
pub struct MeteredExecutor {
    ledger: Arc<dyn Ledger>,
    provider: Arc<dyn Provider>,
    windows: Arc<dyn WindowStore>,
    pricing: PricingConfig,
    rate_limit: RateLimitConfig,
    retry: RetryPolicy,
}

impl MeteredExecutor {
    /// Create a new executor.
    #[must_use]
    pub fn new(
        ledger: Arc<dyn Ledger>,
        provider: Arc<dyn Provider>,
        windows: Arc<dyn WindowStore>,
        pricing: PricingConfig,
        rate_limit: RateLimitConfig,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            ledger,
            provider,
            windows,
            pricing,
            rate_limit,
            retry,
        }
    }

    /// Estimate-only mode: compute the quote without touching the ledger
    /// or invoking any provider.
    ///
    /// # Errors
    ///
    /// Returns `MeterError::Validation` for bad kind/units/options.
    pub fn estimate(
        &self,
        kind: OperationKind,
        units: f64,
        options: Option<&OperationOptions>,
    ) -> Result<PriceQuote, MeterError> {
        self.pricing.price(kind, units, options)
    }

    /// Execute a metered operation for `caller_key`.
    ///
    /// # Errors
    ///
    /// - `Validation` — bad kind/units/options; nothing happened.
    /// - `RateLimited` — quota exceeded; no ledger interaction occurred.
    /// - `InsufficientCredits` — before the provider call if the balance
    ///   cannot cover the quote, or after a successful call if a
    ///   concurrent spend emptied the account (the output is discarded).
    /// - `ProviderUnavailable` / `ProviderFailed` — upstream failure; no
    ///   debit happened.
    pub async fn execute(
        &self,
        caller_key: &str,
        request: ExecuteRequest,
    ) -> Result<ExecuteReceipt, MeterError> {
        // Price first so invalid requests never count against the
        // caller's quota.
        let quote = self
            .pricing
            .price(request.kind, request.units, request.options.as_ref())?;

        let rate = self.windows.check(
            caller_key,
            request.kind.as_str(),
            &self.rate_limit,
            Instant::now(),
        );
        if !rate.allowed {
            return Err(MeterError::RateLimited {
                retry_after_secs: rate.retry_after_secs(),
            });
        }

        // Cheap pre-check so obviously broke accounts never reach the
        // provider. The debit below re-checks atomically.
        if !self
            .ledger
            .has_enough_credits(&request.account_id, quote.total_credits)
            .map_err(store_err)?
        {
            // A second read, but only on the failure path.
            let balance = self
                .ledger
                .get_account(&request.account_id)
                .map_err(store_err)?
                .map_or(0, |account| account.balance_credits);
            return Err(MeterError::InsufficientCredits {
                balance,
                required: quote.total_credits,
            });
        }

        let provider_request = ProviderRequest {
            kind: request.kind,
            units: request.units,
            options: request.options.clone(),
            payload: request.payload,
        };
        let response = invoke_with_retry(self.provider.as_ref(), &provider_request, &self.retry)
            .await
            .map_err(|err| match err {
                e if e.is_transient() => MeterError::ProviderUnavailable {
                    attempts: self.retry.max_attempts,
                    message: e.message().to_string(),
                },
                e => MeterError::ProviderFailed {
                    message: e.message().to_string(),
                },
            })?;

        // Debit the quoted total. If the balance raced below the cost,
        // the operation fails and the output is discarded.
        let update = self
            .ledger
            .debit(&DebitRequest {
                account_id: request.account_id,
                amount_credits: quote.total_credits,
                operation: request.kind,
                description: format!("{} usage", request.kind.as_str()),
                metadata: serde_json::json!({ "units": request.units }),
            })
            .map_err(store_err)?;

        tracing::info!(
            account_id = %request.account_id,
            kind = request.kind.as_str(),
            total_credits = quote.total_credits,
            new_balance = update.new_balance_credits,
            "metered operation committed"
        );

        Ok(ExecuteReceipt {
            output: response.output,
            quote,
            new_balance_credits: update.new_balance_credits,
            entry_id: update.entry_id,
            rate,
        })
    }
}

fn store_err(err: StoreError) -> MeterError {
    match err {
        StoreError::InsufficientCredits { balance, required } => {
            MeterError::InsufficientCredits { balance, required }
        }
        StoreError::Conflict(msg) => MeterError::LedgerConflict(msg),
        StoreError::AccountNotFound { account_id } => MeterError::AccountNotFound { account_id },
        StoreError::InvalidAmount(msg) => MeterError::Validation(msg),
        StoreError::Database(msg) | StoreError::Serialization(msg) => MeterError::Storage(msg),
    }
}
