//! Key encoding for the ledger column families.

use tollbooth_core::{AccountId, EntryId};

/// Account key: the raw 16 UUID bytes.
#[must_use]
pub fn account_key(account_id: &AccountId) -> Vec<u8> {
    account_id.as_bytes().to_vec()
}

/// Entry key: the raw 16 ULID bytes.
#[must_use]
pub fn entry_key(entry_id: &EntryId) -> Vec<u8> {
    entry_id.to_bytes().to_vec()
}

/// Account-entry index key.
///
/// Format: `account_id (16 bytes) || entry_id (16 bytes)`.
///
/// ULIDs are time-ordered, so a forward scan over an account's prefix
/// yields its entries in chronological order.
#[must_use]
pub fn account_entry_key(account_id: &AccountId, entry_id: &EntryId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(account_id.as_bytes());
    key.extend_from_slice(&entry_id.to_bytes());
    key
}

/// Prefix for scanning all of an account's index entries.
#[must_use]
pub fn account_entries_prefix(account_id: &AccountId) -> Vec<u8> {
    account_id.as_bytes().to_vec()
}

/// Extract the entry id from an account-entry index key.
#[must_use]
pub fn entry_id_from_index_key(key: &[u8]) -> Option<EntryId> {
    let bytes: [u8; 16] = key.get(16..32)?.try_into().ok()?;
    Some(EntryId::from_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_key_is_16_bytes() {
        let account_id = AccountId::generate();
        assert_eq!(account_key(&account_id).len(), 16);
    }

    #[test]
    fn index_key_layout() {
        let account_id = AccountId::generate();
        let entry_id = EntryId::generate();
        let key = account_entry_key(&account_id, &entry_id);

        assert_eq!(key.len(), 32);
        assert_eq!(&key[..16], account_id.as_bytes());
        assert_eq!(&key[16..], entry_id.to_bytes());
    }

    #[test]
    fn entry_id_extraction_roundtrip() {
        let account_id = AccountId::generate();
        let entry_id = EntryId::generate();
        let key = account_entry_key(&account_id, &entry_id);

        assert_eq!(entry_id_from_index_key(&key), Some(entry_id));
    }

    #[test]
    fn short_index_key_yields_none() {
        assert_eq!(entry_id_from_index_key(&[0u8; 8]), None);
    }
}
