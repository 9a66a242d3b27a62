//! Account types for tollbooth.
//!
//! Identity is owned by the auth subsystem; the metering core only tracks
//! the credit balance and lifetime counters for each account it is told
//! about.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::AccountId;

/// A metered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// The account ID (from the auth subsystem).
    pub account_id: AccountId,

    /// Current balance in credits. Never negative.
    pub balance_credits: i64,

    /// Lifetime credits granted (purchases, bonuses, refunds).
    pub lifetime_granted_credits: i64,

    /// Lifetime credits consumed by usage.
    pub lifetime_used_credits: i64,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with zero balance.
    #[must_use]
    pub fn new(account_id: AccountId) -> Self {
        let now = Utc::now();
        Self {
            account_id,
            balance_credits: 0,
            lifetime_granted_credits: 0,
            lifetime_used_credits: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the account can cover a deduction.
    #[must_use]
    pub fn has_sufficient_credits(&self, amount_credits: i64) -> bool {
        self.balance_credits >= amount_credits
    }
}
