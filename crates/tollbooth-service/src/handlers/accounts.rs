//! Account balance, grant, history, and usage handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use tollbooth_core::{AccountId, EntryKind, LedgerEntry};
use tollbooth_store::{CreditRequest, UsageStats};

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Maximum history page size.
const MAX_HISTORY_LIMIT: usize = 200;

/// Maximum trailing window for usage aggregation, in days.
const MAX_USAGE_DAYS: i64 = 365;

/// Balance response.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// The account id.
    pub account_id: String,
    /// Current balance in credits.
    pub balance_credits: i64,
    /// Total credits ever granted.
    pub lifetime_granted_credits: i64,
    /// Total credits ever spent.
    pub lifetime_used_credits: i64,
}

/// Get an account's balance.
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<AccountId>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let account = state
        .ledger
        .get_account(&account_id)?
        .ok_or_else(|| ApiError::NotFound(format!("account not found: {account_id}")))?;

    Ok(Json(BalanceResponse {
        account_id: account.account_id.to_string(),
        balance_credits: account.balance_credits,
        lifetime_granted_credits: account.lifetime_granted_credits,
        lifetime_used_credits: account.lifetime_used_credits,
    }))
}

/// Credit grant request body.
#[derive(Debug, Deserialize)]
pub struct GrantRequest {
    /// Amount to add, in credits; must be positive.
    pub amount_credits: i64,
    /// Entry kind; defaults to a purchase.
    #[serde(default = "default_grant_kind")]
    pub kind: EntryKind,
    /// Description for the ledger entry.
    #[serde(default)]
    pub description: Option<String>,
    /// Metadata recorded on the ledger entry.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

fn default_grant_kind() -> EntryKind {
    EntryKind::Purchase
}

/// Credit grant response.
#[derive(Debug, Serialize)]
pub struct GrantResponse {
    /// Balance after the grant.
    pub new_balance_credits: i64,
    /// The appended ledger entry.
    pub entry_id: String,
}

/// Add credits to an account, creating it if needed.
pub async fn grant_credits(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Path(account_id): Path<AccountId>,
    Json(body): Json<GrantRequest>,
) -> Result<Json<GrantResponse>, ApiError> {
    let description = body
        .description
        .unwrap_or_else(|| format!("{} grant", body.kind.as_str()));

    let update = state.ledger.credit(&CreditRequest {
        account_id,
        amount_credits: body.amount_credits,
        kind: body.kind,
        description,
        metadata: body.metadata,
    })?;

    tracing::info!(
        account_id = %account_id,
        amount = body.amount_credits,
        kind = body.kind.as_str(),
        "credits granted"
    );

    Ok(Json(GrantResponse {
        new_balance_credits: update.new_balance_credits,
        entry_id: update.entry_id.to_string(),
    }))
}

/// History query parameters.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Maximum entries to return (default 50, capped at 200).
    #[serde(default = "default_history_limit")]
    pub limit: usize,
    /// Entries to skip (default 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_history_limit() -> usize {
    50
}

/// One ledger entry in API form.
#[derive(Debug, Serialize)]
pub struct EntryResponse {
    /// Entry id.
    pub id: String,
    /// Entry kind.
    pub kind: EntryKind,
    /// Signed amount in credits.
    pub amount_credits: i64,
    /// The metered operation, for usage entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    /// Description.
    pub description: String,
    /// Balance after this entry.
    pub balance_after_credits: i64,
    /// Timestamp (RFC 3339).
    pub created_at: String,
}

impl From<&LedgerEntry> for EntryResponse {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            kind: entry.kind,
            amount_credits: entry.amount_credits,
            operation: entry.operation.map(|op| op.as_str().to_string()),
            description: entry.description.clone(),
            balance_after_credits: entry.balance_after_credits,
            created_at: entry.created_at.to_rfc3339(),
        }
    }
}

/// History response.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    /// Entries, newest first.
    pub entries: Vec<EntryResponse>,
    /// Exact total entry count for the account.
    pub total: usize,
    /// Whether more entries remain past this page.
    pub has_more: bool,
}

/// List an account's ledger history, newest first.
pub async fn history(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<AccountId>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let limit = query.limit.min(MAX_HISTORY_LIMIT);
    let page = state.ledger.history(&account_id, limit, query.offset)?;

    let has_more = query.offset + page.entries.len() < page.total;
    let entries = page.entries.iter().map(EntryResponse::from).collect();

    Ok(Json(HistoryResponse {
        entries,
        total: page.total,
        has_more,
    }))
}

/// Usage query parameters.
#[derive(Debug, Deserialize)]
pub struct UsageQuery {
    /// Trailing window in days (default 30, capped at 365).
    #[serde(default = "default_usage_days")]
    pub days: i64,
}

fn default_usage_days() -> i64 {
    30
}

/// Usage response.
#[derive(Debug, Serialize)]
pub struct UsageResponse {
    /// The account id.
    pub account_id: String,
    /// Window length in days.
    pub days: i64,
    /// Aggregated usage.
    #[serde(flatten)]
    pub stats: UsageStats,
}

/// Aggregate an account's usage over a trailing window of days.
pub async fn usage(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<AccountId>,
    Query(query): Query<UsageQuery>,
) -> Result<Json<UsageResponse>, ApiError> {
    let days = query.days.clamp(1, MAX_USAGE_DAYS);
    let stats = state.ledger.usage_stats(&account_id, days)?;

    Ok(Json(UsageResponse {
        account_id: account_id.to_string(),
        days,
        stats,
    }))
}
