//! Trade repository for JSON storage
//!
//! Manages loading and saving trades to trades.json, keeps an index by
//! account and tracks how many bytes the stored records take so writes can
//! be refused once the configured storage quota is reached.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::error::JournalError;
use crate::models::{AccountId, Trade, TradeId, TradeUid};

use super::file_io::{read_json, write_json_atomic};
use super::migrate::upgrade_trade;

/// Serializable trade data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct TradeData {
    trades: Vec<Trade>,
}

#[derive(Default)]
struct TradeTable {
    trades: HashMap<TradeId, Trade>,
    /// Index: account_id -> trade_ids
    by_account: HashMap<AccountId, Vec<TradeId>>,
    /// Serialized size of each stored trade
    sizes: HashMap<TradeId, u64>,
    used_bytes: u64,
}

impl TradeTable {
    fn remove(&mut self, id: TradeId) -> Option<Trade> {
        let old = self.trades.remove(&id)?;
        if let Some(ids) = self.by_account.get_mut(&old.account_id) {
            ids.retain(|&t| t != id);
        }
        if let Some(size) = self.sizes.remove(&id) {
            self.used_bytes = self.used_bytes.saturating_sub(size);
        }
        Some(old)
    }

    fn insert(&mut self, trade: Trade, size: u64) {
        self.remove(trade.id);
        self.by_account
            .entry(trade.account_id)
            .or_default()
            .push(trade.id);
        self.sizes.insert(trade.id, size);
        self.used_bytes += size;
        self.trades.insert(trade.id, trade);
    }

    fn clear(&mut self) {
        self.trades.clear();
        self.by_account.clear();
        self.sizes.clear();
        self.used_bytes = 0;
    }
}

fn record_size(trade: &Trade) -> Result<u64, JournalError> {
    Ok(serde_json::to_vec(trade)?.len() as u64)
}

fn newest_first(trades: &mut [Trade]) {
    trades.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
}

/// Repository for trade persistence with indexing and quota tracking
pub struct TradeRepository {
    path: PathBuf,
    quota_bytes: Option<u64>,
    data: RwLock<TradeTable>,
}

impl TradeRepository {
    /// Create a new trade repository without a storage quota
    pub fn new(path: PathBuf) -> Self {
        Self::with_quota(path, None)
    }

    /// Create a trade repository that refuses writes beyond `quota_bytes`
    pub fn with_quota(path: PathBuf, quota_bytes: Option<u64>) -> Self {
        Self {
            path,
            quota_bytes,
            data: RwLock::new(TradeTable::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, TradeTable>, JournalError> {
        self.data
            .read()
            .map_err(|e| JournalError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, TradeTable>, JournalError> {
        self.data
            .write()
            .map_err(|e| JournalError::Storage(format!("Failed to acquire write lock: {}", e)))
    }

    /// Load trades from disk, upgrading legacy records
    ///
    /// Returns the number of records that were upgraded.
    pub fn load(&self) -> Result<usize, JournalError> {
        let file_data: TradeData = read_json(&self.path)?;

        let mut table = self.write()?;
        table.clear();

        let mut upgraded = 0;
        for mut trade in file_data.trades {
            if upgrade_trade(&mut trade) {
                upgraded += 1;
            }
            let size = record_size(&trade)?;
            table.insert(trade, size);
        }

        debug!(
            trades = table.trades.len(),
            bytes = table.used_bytes,
            upgraded,
            "Loaded trades"
        );
        Ok(upgraded)
    }

    /// Save trades to disk, newest first
    pub fn save(&self) -> Result<(), JournalError> {
        let file_data = TradeData {
            trades: self.get_all()?,
        };
        write_json_atomic(&self.path, &file_data)
    }

    /// Get a trade by ID
    pub fn get(&self, id: TradeId) -> Result<Option<Trade>, JournalError> {
        Ok(self.read()?.trades.get(&id).cloned())
    }

    /// Find a trade by its uid
    pub fn get_by_uid(&self, uid: &TradeUid) -> Result<Option<Trade>, JournalError> {
        Ok(self
            .read()?
            .trades
            .values()
            .find(|t| &t.uid == uid)
            .cloned())
    }

    /// Get all trades, newest first
    pub fn get_all(&self) -> Result<Vec<Trade>, JournalError> {
        let mut trades: Vec<_> = self.read()?.trades.values().cloned().collect();
        newest_first(&mut trades);
        Ok(trades)
    }

    /// Get trades for an account, newest first
    pub fn get_by_account(&self, account_id: AccountId) -> Result<Vec<Trade>, JournalError> {
        let table = self.read()?;
        let ids = table
            .by_account
            .get(&account_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[]);
        let mut trades: Vec<_> = ids
            .iter()
            .filter_map(|id| table.trades.get(id).cloned())
            .collect();
        newest_first(&mut trades);
        Ok(trades)
    }

    /// Insert or update a trade
    ///
    /// Fails with `QuotaExceeded` when the record would push stored bytes
    /// past the quota; the repository is left unchanged in that case.
    pub fn upsert(&self, trade: Trade) -> Result<(), JournalError> {
        let size = record_size(&trade)?;
        let mut table = self.write()?;

        if let Some(quota) = self.quota_bytes {
            let existing = table.sizes.get(&trade.id).copied().unwrap_or(0);
            let projected = table.used_bytes - existing + size;
            if projected > quota {
                return Err(JournalError::QuotaExceeded(format!(
                    "trade {} needs {} bytes but only {} of {} bytes remain",
                    trade.uid,
                    size,
                    quota.saturating_sub(table.used_bytes - existing),
                    quota
                )));
            }
        }

        table.insert(trade, size);
        Ok(())
    }

    /// Delete a trade
    pub fn delete(&self, id: TradeId) -> Result<Option<Trade>, JournalError> {
        Ok(self.write()?.remove(id))
    }

    /// Delete every trade belonging to an account, returning how many went
    pub fn delete_by_account(&self, account_id: AccountId) -> Result<usize, JournalError> {
        let mut table = self.write()?;
        let ids = table.by_account.remove(&account_id).unwrap_or_default();
        let count = ids.len();
        for id in ids {
            table.remove(id);
        }
        Ok(count)
    }

    /// Remove every trade
    pub fn clear(&self) -> Result<(), JournalError> {
        self.write()?.clear();
        Ok(())
    }

    /// Count trades
    pub fn count(&self) -> Result<usize, JournalError> {
        Ok(self.read()?.trades.len())
    }

    /// Bytes currently taken by stored trades
    pub fn used_bytes(&self) -> Result<u64, JournalError> {
        Ok(self.read()?.used_bytes)
    }

    /// Configured quota, if any
    pub fn quota_bytes(&self) -> Option<u64> {
        self.quota_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn trade(id: i64, account: u32, day: u32) -> Trade {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "uid": format!("trade_{}_abcdefghi", id),
            "accountId": account,
            "symbol": "BTCUSDT",
            "date": NaiveDate::from_ymd_opt(2024, 5, day)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap()
                .format("%Y-%m-%dT%H:%M")
                .to_string(),
            "type": "buy",
            "entryPrice": 100.0,
            "stopLoss": 90.0,
            "takeProfit": 120.0,
            "riskPercent": 1.0
        }))
        .unwrap()
    }

    fn create_test_repo() -> (TempDir, TradeRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = TradeRepository::new(temp_dir.path().join("trades.json"));
        (temp_dir, repo)
    }

    #[test]
    fn test_upsert_and_index() {
        let (_temp_dir, repo) = create_test_repo();
        repo.upsert(trade(1, 1, 1)).unwrap();
        repo.upsert(trade(2, 1, 3)).unwrap();
        repo.upsert(trade(3, 2, 2)).unwrap();

        let main = repo.get_by_account(AccountId::new(1)).unwrap();
        assert_eq!(main.len(), 2);
        assert_eq!(main[0].id, TradeId::new(2));

        let uid = TradeUid::from_string("trade_3_abcdefghi");
        assert_eq!(repo.get_by_uid(&uid).unwrap().unwrap().id, TradeId::new(3));
    }

    #[test]
    fn test_update_moves_account_index() {
        let (_temp_dir, repo) = create_test_repo();
        let mut t = trade(1, 1, 1);
        repo.upsert(t.clone()).unwrap();

        t.account_id = AccountId::new(2);
        repo.upsert(t).unwrap();

        assert!(repo.get_by_account(AccountId::new(1)).unwrap().is_empty());
        assert_eq!(repo.get_by_account(AccountId::new(2)).unwrap().len(), 1);
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_delete_by_account() {
        let (_temp_dir, repo) = create_test_repo();
        repo.upsert(trade(1, 1, 1)).unwrap();
        repo.upsert(trade(2, 2, 1)).unwrap();
        repo.upsert(trade(3, 2, 2)).unwrap();

        assert_eq!(repo.delete_by_account(AccountId::new(2)).unwrap(), 2);
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_save_and_reload_upgrades_legacy() {
        let (temp_dir, repo) = create_test_repo();
        let mut legacy = trade(42, 1, 1);
        legacy.uid = TradeUid::from_string("");
        repo.upsert(legacy).unwrap();
        repo.save().unwrap();

        let repo2 = TradeRepository::new(temp_dir.path().join("trades.json"));
        assert_eq!(repo2.load().unwrap(), 1);
        let loaded = repo2.get(TradeId::new(42)).unwrap().unwrap();
        assert_eq!(loaded.uid.as_str(), "trade_42");
    }

    #[test]
    fn test_quota_refuses_write() {
        let temp_dir = TempDir::new().unwrap();
        let one = record_size(&trade(1, 1, 1)).unwrap();
        let repo = TradeRepository::with_quota(temp_dir.path().join("trades.json"), Some(one * 2));

        repo.upsert(trade(1, 1, 1)).unwrap();
        repo.upsert(trade(2, 1, 2)).unwrap();
        let err = repo.upsert(trade(3, 1, 3)).unwrap_err();
        assert!(err.is_quota_exceeded());
        assert_eq!(repo.count().unwrap(), 2);

        // Rewriting an existing record within its size still fits
        repo.upsert(trade(2, 1, 2)).unwrap();
    }

    #[test]
    fn test_used_bytes_tracks_deletes() {
        let (_temp_dir, repo) = create_test_repo();
        repo.upsert(trade(1, 1, 1)).unwrap();
        assert!(repo.used_bytes().unwrap() > 0);
        repo.delete(TradeId::new(1)).unwrap();
        assert_eq!(repo.used_bytes().unwrap(), 0);
    }
}
