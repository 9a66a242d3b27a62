//! `RocksDB` ledger implementation.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, ErrorKind,
    IteratorMode, MultiThreaded, Options, WriteBatch,
};
use std::sync::Arc;

use tollbooth_core::{Account, AccountId, EntryKind, LedgerEntry};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::{CreditRequest, DailyUsage, DebitRequest, HistoryPage, Ledger, LedgerUpdate, UsageStats};

/// Number of account lock shards. Mutations for one account always hash to
/// the same shard; unrelated accounts rarely share one.
const LOCK_SHARDS: usize = 32;

/// RocksDB-backed ledger.
pub struct RocksLedger {
    db: DBWithThreadMode<MultiThreaded>,
    account_locks: Vec<Mutex<()>>,
}

impl RocksLedger {
    /// Open or create the ledger database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(map_db_err)?;

        let account_locks = (0..LOCK_SHARDS).map(|_| Mutex::new(())).collect();

        Ok(Self { db, account_locks })
    }

    /// Acquire the write lock serializing mutations for this account.
    fn lock_account(&self, account_id: &AccountId) -> MutexGuard<'_, ()> {
        let mut hasher = DefaultHasher::new();
        account_id.as_bytes().hash(&mut hasher);
        let index = (hasher.finish() as usize) % LOCK_SHARDS;
        self.account_locks[index]
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Write an updated account plus its new ledger entry as one batch.
    fn commit(&self, account: &Account, entry: &LedgerEntry) -> Result<()> {
        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        let cf_entries = self.cf(cf::ENTRIES)?;
        let cf_index = self.cf(cf::ENTRIES_BY_ACCOUNT)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_accounts,
            keys::account_key(&account.account_id),
            Self::serialize(account)?,
        );
        batch.put_cf(&cf_entries, keys::entry_key(&entry.id), Self::serialize(entry)?);
        batch.put_cf(
            &cf_index,
            keys::account_entry_key(&account.account_id, &entry.id),
            [],
        );

        self.db.write(batch).map_err(map_db_err)
    }

    /// Collect all index keys for an account, oldest first.
    fn index_keys(&self, account_id: &AccountId) -> Result<Vec<Vec<u8>>> {
        let cf_index = self.cf(cf::ENTRIES_BY_ACCOUNT)?;
        let prefix = keys::account_entries_prefix(account_id);

        let iter = self
            .db
            .iterator_cf(&cf_index, IteratorMode::From(&prefix, Direction::Forward));

        let mut all_keys = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(map_db_err)?;
            if !key.starts_with(&prefix) {
                break;
            }
            all_keys.push(key.to_vec());
        }

        Ok(all_keys)
    }

    fn get_entry(&self, key: &[u8]) -> Result<Option<LedgerEntry>> {
        let cf_entries = self.cf(cf::ENTRIES)?;
        self.db
            .get_cf(&cf_entries, key)
            .map_err(map_db_err)?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }
}

fn map_db_err(e: rocksdb::Error) -> StoreError {
    match e.kind() {
        ErrorKind::Busy | ErrorKind::TryAgain => StoreError::Conflict(e.to_string()),
        _ => StoreError::Database(e.to_string()),
    }
}

impl Ledger for RocksLedger {
    fn put_account(&self, account: &Account) -> Result<()> {
        let cf = self.cf(cf::ACCOUNTS)?;
        self.db
            .put_cf(
                &cf,
                keys::account_key(&account.account_id),
                Self::serialize(account)?,
            )
            .map_err(map_db_err)
    }

    fn get_account(&self, account_id: &AccountId) -> Result<Option<Account>> {
        let cf = self.cf(cf::ACCOUNTS)?;
        self.db
            .get_cf(&cf, keys::account_key(account_id))
            .map_err(map_db_err)?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn has_enough_credits(&self, account_id: &AccountId, amount_credits: i64) -> Result<bool> {
        // A missing account reads as balance zero.
        let account = self
            .get_account(account_id)?
            .unwrap_or_else(|| Account::new(*account_id));
        Ok(account.has_sufficient_credits(amount_credits))
    }

    fn debit(&self, request: &DebitRequest) -> Result<LedgerUpdate> {
        if request.amount_credits <= 0 {
            return Err(StoreError::InvalidAmount(format!(
                "debit amount must be positive, got {}",
                request.amount_credits
            )));
        }

        let _guard = self.lock_account(&request.account_id);

        // Re-read under the lock: the balance may have moved since any
        // earlier pre-check.
        let mut account = self
            .get_account(&request.account_id)?
            .unwrap_or_else(|| Account::new(request.account_id));

        if account.balance_credits < request.amount_credits {
            return Err(StoreError::InsufficientCredits {
                balance: account.balance_credits,
                required: request.amount_credits,
            });
        }

        account.balance_credits -= request.amount_credits;
        account.lifetime_used_credits += request.amount_credits;
        account.updated_at = chrono::Utc::now();

        let entry = LedgerEntry::usage(
            request.account_id,
            request.amount_credits,
            account.balance_credits,
            request.operation,
            request.description.clone(),
            request.metadata.clone(),
        );

        self.commit(&account, &entry)?;

        tracing::debug!(
            account_id = %request.account_id,
            amount = request.amount_credits,
            new_balance = account.balance_credits,
            operation = request.operation.as_str(),
            "debit committed"
        );

        Ok(LedgerUpdate {
            new_balance_credits: account.balance_credits,
            entry_id: entry.id,
        })
    }

    fn credit(&self, request: &CreditRequest) -> Result<LedgerUpdate> {
        if request.amount_credits <= 0 {
            return Err(StoreError::InvalidAmount(format!(
                "credit amount must be positive, got {}",
                request.amount_credits
            )));
        }
        if !request.kind.is_credit() {
            return Err(StoreError::InvalidAmount(format!(
                "{} is not a credit entry kind",
                request.kind.as_str()
            )));
        }

        let _guard = self.lock_account(&request.account_id);

        let mut account = self
            .get_account(&request.account_id)?
            .unwrap_or_else(|| Account::new(request.account_id));

        account.balance_credits += request.amount_credits;
        account.lifetime_granted_credits += request.amount_credits;
        account.updated_at = chrono::Utc::now();

        let entry = match request.kind {
            EntryKind::Purchase => LedgerEntry::purchase(
                request.account_id,
                request.amount_credits,
                account.balance_credits,
                request.description.clone(),
            ),
            EntryKind::Bonus => LedgerEntry::bonus(
                request.account_id,
                request.amount_credits,
                account.balance_credits,
                request.description.clone(),
            ),
            EntryKind::Refund => LedgerEntry::refund(
                request.account_id,
                request.amount_credits,
                account.balance_credits,
                request.description.clone(),
            ),
            EntryKind::Usage => {
                return Err(StoreError::InvalidAmount(
                    "usage entries are appended by debit".into(),
                ))
            }
        }
        .with_metadata(request.metadata.clone());

        self.commit(&account, &entry)?;

        tracing::debug!(
            account_id = %request.account_id,
            amount = request.amount_credits,
            kind = request.kind.as_str(),
            new_balance = account.balance_credits,
            "credit committed"
        );

        Ok(LedgerUpdate {
            new_balance_credits: account.balance_credits,
            entry_id: entry.id,
        })
    }

    fn history(&self, account_id: &AccountId, limit: usize, offset: usize) -> Result<HistoryPage> {
        let mut all_keys = self.index_keys(account_id)?;
        let total = all_keys.len();

        // Newest first.
        all_keys.reverse();

        let mut entries = Vec::new();
        for key in all_keys.into_iter().skip(offset).take(limit) {
            let Some(entry_id) = keys::entry_id_from_index_key(&key) else {
                continue;
            };
            if let Some(entry) = self.get_entry(&keys::entry_key(&entry_id))? {
                entries.push(entry);
            }
        }

        Ok(HistoryPage { entries, total })
    }

    fn usage_stats(&self, account_id: &AccountId, days: i64) -> Result<UsageStats> {
        let cutoff = chrono::Utc::now() - chrono::Duration::days(days.max(0));

        let mut total_credits_used = 0;
        let mut by_kind: BTreeMap<String, i64> = BTreeMap::new();
        let mut per_day: BTreeMap<chrono::NaiveDate, i64> = BTreeMap::new();

        for key in self.index_keys(account_id)? {
            let Some(entry_id) = keys::entry_id_from_index_key(&key) else {
                continue;
            };
            let Some(entry) = self.get_entry(&keys::entry_key(&entry_id))? else {
                continue;
            };

            if entry.kind != EntryKind::Usage || entry.created_at < cutoff {
                continue;
            }

            let used = entry.amount_credits.abs();
            total_credits_used += used;

            let kind_key = entry
                .operation
                .map_or_else(|| "other".to_string(), |op| op.as_str().to_string());
            *by_kind.entry(kind_key).or_insert(0) += used;
            *per_day.entry(entry.created_at.date_naive()).or_insert(0) += used;
        }

        let daily = per_day
            .into_iter()
            .map(|(date, credits_used)| DailyUsage { date, credits_used })
            .collect();

        Ok(UsageStats {
            total_credits_used,
            by_kind,
            daily,
        })
    }
}
