//! Storage layer for the trade journal
//!
//! JSON file repositories with atomic writes, plus the `Storage` coordinator
//! that owns them together with the audit log.

pub mod accounts;
pub mod file_io;
pub mod init;
pub mod migrate;
pub mod trades;

pub use accounts::AccountRepository;
pub use file_io::{read_json, write_json_atomic};
pub use init::initialize_storage;
pub use trades::TradeRepository;

use serde::Serialize;
use tracing::info;

use crate::audit::{generate_diff, AuditEntry, AuditLogger, EntityType};
use crate::config::paths::JournalPaths;
use crate::config::settings::Settings;
use crate::error::JournalError;

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: JournalPaths,
    pub accounts: AccountRepository,
    pub trades: TradeRepository,
    audit: AuditLogger,
}

impl Storage {
    /// Create a Storage instance without a storage quota
    pub fn new(paths: JournalPaths) -> Result<Self, JournalError> {
        Self::with_quota(paths, None)
    }

    /// Create a Storage instance honouring the quota configured in settings
    pub fn open(paths: JournalPaths, settings: &Settings) -> Result<Self, JournalError> {
        Self::with_quota(paths, settings.storage_quota_bytes)
    }

    /// Create a Storage instance that refuses trade writes past `quota_bytes`
    pub fn with_quota(paths: JournalPaths, quota_bytes: Option<u64>) -> Result<Self, JournalError> {
        paths.ensure_directories()?;

        Ok(Self {
            accounts: AccountRepository::new(paths.accounts_file()),
            trades: TradeRepository::with_quota(paths.trades_file(), quota_bytes),
            audit: AuditLogger::new(paths.audit_log()),
            paths,
        })
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &JournalPaths {
        &self.paths
    }

    /// Get the audit logger
    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Load all data from disk
    ///
    /// Creates the primary account if storage has none, and persists any
    /// legacy trades that were upgraded while loading.
    pub fn load_all(&mut self) -> Result<(), JournalError> {
        self.accounts.load()?;
        if init::ensure_primary_account(&self.accounts)? {
            self.accounts.save()?;
        }

        let upgraded = self.trades.load()?;
        if upgraded > 0 {
            info!(upgraded, "Upgraded legacy trade records");
            self.trades.save()?;
        }
        Ok(())
    }

    /// Save all data to disk
    pub fn save_all(&self) -> Result<(), JournalError> {
        self.accounts.save()?;
        self.trades.save()?;
        Ok(())
    }

    /// Check if storage has been initialized
    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }

    /// Record a created entity in the audit log
    pub fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: String,
        entity_name: Option<String>,
        entity: &T,
    ) -> Result<(), JournalError> {
        self.audit
            .log(&AuditEntry::create(entity_type, entity_id, entity_name, entity))
    }

    /// Record an updated entity in the audit log with a field diff
    pub fn log_update<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: String,
        entity_name: Option<String>,
        before: &T,
        after: &T,
    ) -> Result<(), JournalError> {
        let diff = match (serde_json::to_value(before), serde_json::to_value(after)) {
            (Ok(b), Ok(a)) => generate_diff(&b, &a),
            _ => None,
        };
        self.audit.log(&AuditEntry::update(
            entity_type,
            entity_id,
            entity_name,
            before,
            after,
            diff,
        ))
    }

    /// Record a deleted entity in the audit log
    pub fn log_delete<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: String,
        entity_name: Option<String>,
        entity: &T,
    ) -> Result<(), JournalError> {
        self.audit
            .log(&AuditEntry::delete(entity_type, entity_id, entity_name, entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::Operation;
    use crate::models::{Account, AccountId};
    use tempfile::TempDir;

    #[test]
    fn test_storage_creation() {
        let temp_dir = TempDir::new().unwrap();
        let paths = JournalPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();

        assert!(temp_dir.path().join("data").exists());
        assert!(temp_dir.path().join("backups").exists());
        assert!(!storage.is_initialized());
    }

    #[test]
    fn test_load_all_creates_primary_account() {
        let temp_dir = TempDir::new().unwrap();
        let paths = JournalPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();

        assert!(storage.accounts.exists(AccountId::PRIMARY).unwrap());
        assert!(storage.paths().accounts_file().exists());
    }

    #[test]
    fn test_update_logs_diff() {
        let temp_dir = TempDir::new().unwrap();
        let paths = JournalPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();

        let before = Account::new(AccountId::new(2), "Futures", 100.0);
        let mut after = before.clone();
        after.set_balance(250.0);
        storage
            .log_update(EntityType::Account, "2".into(), None, &before, &after)
            .unwrap();

        let entries = storage.audit().read_all().unwrap();
        assert_eq!(entries[0].operation, Operation::Update);
        assert_eq!(
            entries[0].diff_summary.as_deref(),
            Some("balance: 100.0 -> 250.0")
        );
    }
}
