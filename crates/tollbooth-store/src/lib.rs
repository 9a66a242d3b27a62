//! `RocksDB` credit ledger for tollbooth.
//!
//! This crate stores account balances and an append-only ledger of balance
//! changes. Balances and entries are written in one `WriteBatch`, and all
//! mutations for an account are serialized by a sharded lock, so a
//! concurrent debit can never observe a negative or stale intermediate
//! balance. Unrelated accounts never contend.
//!
//! # Column families
//!
//! - `accounts`: account records keyed by account id
//! - `entries`: ledger entries keyed by entry id (ULID)
//! - `entries_by_account`: index keyed by `account_id || entry_id`
//!
//! # Example
//!
//! ```no_run
//! use tollbooth_store::{CreditRequest, Ledger, RocksLedger};
//! use tollbooth_core::{AccountId, EntryKind};
//!
//! let ledger = RocksLedger::open("/tmp/tollbooth-db").unwrap();
//! let account_id = AccountId::generate();
//!
//! let update = ledger
//!     .credit(&CreditRequest {
//!         account_id,
//!         amount_credits: 100,
//!         kind: EntryKind::Purchase,
//!         description: "Purchased 100 credits".into(),
//!         metadata: serde_json::Value::Null,
//!     })
//!     .unwrap();
//! assert_eq!(update.new_balance_credits, 100);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksLedger;

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use tollbooth_core::{Account, AccountId, EntryId, EntryKind, LedgerEntry, OperationKind};

/// A request to deduct credits from an account.
#[derive(Debug, Clone)]
pub struct DebitRequest {
    /// The account to charge.
    pub account_id: AccountId,
    /// Amount in credits; must be positive.
    pub amount_credits: i64,
    /// The metered operation being paid for.
    pub operation: OperationKind,
    /// Human-readable description for the ledger entry.
    pub description: String,
    /// Metadata recorded on the ledger entry (units, request id, etc.).
    pub metadata: serde_json::Value,
}

/// A request to add credits to an account.
#[derive(Debug, Clone)]
pub struct CreditRequest {
    /// The account to credit.
    pub account_id: AccountId,
    /// Amount in credits; must be positive.
    pub amount_credits: i64,
    /// Entry kind; must be a credit kind (purchase, bonus, refund).
    pub kind: EntryKind,
    /// Human-readable description for the ledger entry.
    pub description: String,
    /// Metadata recorded on the ledger entry.
    pub metadata: serde_json::Value,
}

/// The result of a successful debit or credit.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerUpdate {
    /// Balance after the operation, in credits.
    pub new_balance_credits: i64,
    /// The appended ledger entry's id.
    pub entry_id: EntryId,
}

/// One page of an account's ledger history.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryPage {
    /// Entries, newest first.
    pub entries: Vec<LedgerEntry>,
    /// Exact total entry count for the account, independent of paging.
    pub total: usize,
}

/// Usage aggregated over a trailing window of days.
#[derive(Debug, Clone, Serialize)]
pub struct UsageStats {
    /// Total credits consumed in the window.
    pub total_credits_used: i64,
    /// Credits consumed per operation kind.
    pub by_kind: BTreeMap<String, i64>,
    /// Per-day usage, ascending by date. Days without activity are omitted.
    pub daily: Vec<DailyUsage>,
}

/// Credits consumed on one calendar day.
#[derive(Debug, Clone, Serialize)]
pub struct DailyUsage {
    /// The calendar day (UTC).
    pub date: NaiveDate,
    /// Credits consumed that day.
    pub credits_used: i64,
}

/// The ledger trait defining all durable credit-accounting operations.
///
/// Abstracting the storage lets tests and alternative backends slot in
/// behind the same contract.
pub trait Ledger: Send + Sync {
    /// Insert or update an account record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_account(&self, account: &Account) -> Result<()>;

    /// Get an account by id. Missing accounts read as `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_account(&self, account_id: &AccountId) -> Result<Option<Account>>;

    /// Check whether an account can cover `amount_credits`.
    ///
    /// A missing account behaves as balance zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn has_enough_credits(&self, account_id: &AccountId, amount_credits: i64) -> Result<bool>;

    /// Atomically deduct credits and append a usage ledger entry.
    ///
    /// The balance re-read, sufficiency check, decrement, and entry append
    /// are one unit; a failed debit changes nothing.
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidAmount` if the amount is not positive.
    /// - `StoreError::InsufficientCredits` if the balance is too low.
    fn debit(&self, request: &DebitRequest) -> Result<LedgerUpdate>;

    /// Atomically add credits and append a ledger entry.
    ///
    /// Creates the account record if it does not exist yet; no sufficiency
    /// check.
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidAmount` if the amount is not positive or the
    ///   kind is not a credit kind.
    fn credit(&self, request: &CreditRequest) -> Result<LedgerUpdate>;

    /// List an account's ledger entries, newest first, with an exact total.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn history(&self, account_id: &AccountId, limit: usize, offset: usize) -> Result<HistoryPage>;

    /// Aggregate usage entries from `now - days` to now.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn usage_stats(&self, account_id: &AccountId, days: i64) -> Result<UsageStats>;
}
