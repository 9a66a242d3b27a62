//! Column-family schema for the ledger database.

/// Column family names.
pub mod cf {
    /// Account records, keyed by account id (16 bytes).
    pub const ACCOUNTS: &str = "accounts";

    /// Ledger entries, keyed by entry id (16-byte ULID).
    pub const ENTRIES: &str = "entries";

    /// Index: entries by account, keyed by `account_id || entry_id`.
    /// Value is empty (index only).
    pub const ENTRIES_BY_ACCOUNT: &str = "entries_by_account";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![cf::ACCOUNTS, cf::ENTRIES, cf::ENTRIES_BY_ACCOUNT]
}
