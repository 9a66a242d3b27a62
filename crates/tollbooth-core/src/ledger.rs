//! Ledger entry types for tollbooth.
//!
//! Every balance change is recorded as an immutable, append-only
//! [`LedgerEntry`]. The sum of an account's entries must always reconcile
//! with its balance. Usage statistics are a projection over entries with
//! [`EntryKind::Usage`]; there is no separate usage log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pricing::OperationKind;
use crate::{AccountId, EntryId};

/// An immutable record of a balance change.
///
/// Entries are never mutated or deleted. `amount_credits` is signed:
/// negative for usage, positive for everything else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique entry ID (ULID, time-ordered).
    pub id: EntryId,

    /// The account whose balance changed.
    pub account_id: AccountId,

    /// Type of entry.
    pub kind: EntryKind,

    /// Signed amount in credits.
    pub amount_credits: i64,

    /// The metered operation that produced this entry, for usage entries.
    pub operation: Option<OperationKind>,

    /// Human-readable description.
    pub description: String,

    /// Additional context (units, request id, etc.).
    pub metadata: serde_json::Value,

    /// Balance after this entry was applied (in credits).
    pub balance_after_credits: i64,

    /// When the entry was created.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Create a usage entry (deduction). The stored amount is always negative.
    #[must_use]
    pub fn usage(
        account_id: AccountId,
        amount_credits: i64,
        balance_after_credits: i64,
        operation: OperationKind,
        description: String,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: EntryId::generate(),
            account_id,
            kind: EntryKind::Usage,
            amount_credits: -amount_credits.abs(),
            operation: Some(operation),
            description,
            metadata,
            balance_after_credits,
            created_at: Utc::now(),
        }
    }

    /// Create a purchase entry.
    #[must_use]
    pub fn purchase(
        account_id: AccountId,
        amount_credits: i64,
        balance_after_credits: i64,
        description: String,
    ) -> Self {
        Self::grant(
            account_id,
            EntryKind::Purchase,
            amount_credits,
            balance_after_credits,
            description,
        )
    }

    /// Create a bonus entry.
    #[must_use]
    pub fn bonus(
        account_id: AccountId,
        amount_credits: i64,
        balance_after_credits: i64,
        reason: String,
    ) -> Self {
        Self::grant(
            account_id,
            EntryKind::Bonus,
            amount_credits,
            balance_after_credits,
            reason,
        )
    }

    /// Create a refund entry.
    #[must_use]
    pub fn refund(
        account_id: AccountId,
        amount_credits: i64,
        balance_after_credits: i64,
        reason: String,
    ) -> Self {
        Self::grant(
            account_id,
            EntryKind::Refund,
            amount_credits,
            balance_after_credits,
            reason,
        )
    }

    /// Attach metadata to the entry.
    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    fn grant(
        account_id: AccountId,
        kind: EntryKind,
        amount_credits: i64,
        balance_after_credits: i64,
        description: String,
    ) -> Self {
        Self {
            id: EntryId::generate(),
            account_id,
            kind,
            amount_credits: amount_credits.abs(),
            operation: None,
            description,
            metadata: serde_json::Value::Null,
            balance_after_credits,
            created_at: Utc::now(),
        }
    }
}

/// Type of ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Credits deducted for a metered operation.
    Usage,

    /// Credits bought by the account holder.
    Purchase,

    /// Promotional or goodwill credits.
    Bonus,

    /// Credits returned after a dispute or failed delivery.
    Refund,
}

impl EntryKind {
    /// Whether this entry kind adds credits.
    #[must_use]
    pub const fn is_credit(&self) -> bool {
        matches!(self, Self::Purchase | Self::Bonus | Self::Refund)
    }

    /// Whether this entry kind removes credits.
    #[must_use]
    pub const fn is_debit(&self) -> bool {
        matches!(self, Self::Usage)
    }

    /// Entry kind as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Usage => "usage",
            Self::Purchase => "purchase",
            Self::Bonus => "bonus",
            Self::Refund => "refund",
        }
    }
}
