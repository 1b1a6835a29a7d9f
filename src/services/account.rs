//! Account service
//!
//! Business logic for trading accounts: creation, balance updates, the
//! active-account setting and cascade deletion.

use tracing::info;

use crate::audit::EntityType;
use crate::config::settings::Settings;
use crate::error::{JournalError, JournalResult};
use crate::models::account::round_cents;
use crate::models::{Account, AccountId};
use crate::storage::Storage;

/// Service for account management
pub struct AccountService<'a> {
    storage: &'a Storage,
}

/// Outcome of deleting an account
#[derive(Debug, Clone)]
pub struct AccountDeletion {
    pub account: Account,
    pub trades_removed: usize,
    /// Set when the deleted account was active and the primary took over
    pub new_active: Option<AccountId>,
}

/// An account with its trade counts and realized result
#[derive(Debug, Clone)]
pub struct AccountSummary {
    pub account: Account,
    pub trade_count: usize,
    pub open_trades: usize,
    pub realized_pnl: f64,
}

fn validate_balance(balance: f64) -> JournalResult<f64> {
    if !balance.is_finite() || balance <= 0.0 {
        return Err(JournalError::Validation(
            "Balance must be a number greater than zero".into(),
        ));
    }
    Ok(round_cents(balance))
}

impl<'a> AccountService<'a> {
    /// Create a new account service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a new account with a starting balance
    pub fn create(&self, name: &str, balance: f64) -> JournalResult<Account> {
        let name = name.trim();
        if name.is_empty() {
            return Err(JournalError::Validation(
                "Account name cannot be empty".into(),
            ));
        }
        let balance = validate_balance(balance)?;

        if self.storage.accounts.name_exists(name, None)? {
            return Err(JournalError::Duplicate {
                entity_type: "Account",
                identifier: name.to_string(),
            });
        }

        let account = Account::new(self.storage.accounts.next_id()?, name, balance);
        account
            .validate()
            .map_err(|e| JournalError::Validation(e.to_string()))?;

        self.storage.accounts.upsert(account.clone())?;
        self.storage.accounts.save()?;

        self.storage.log_create(
            EntityType::Account,
            account.id.to_string(),
            Some(account.name.clone()),
            &account,
        )?;

        Ok(account)
    }

    /// Get an account by ID
    pub fn get(&self, id: AccountId) -> JournalResult<Option<Account>> {
        self.storage.accounts.get(id)
    }

    /// Find an account by name or ID string
    pub fn find(&self, identifier: &str) -> JournalResult<Option<Account>> {
        if let Some(account) = self.storage.accounts.get_by_name(identifier)? {
            return Ok(Some(account));
        }

        if let Ok(id) = identifier.parse::<AccountId>() {
            return self.storage.accounts.get(id);
        }

        Ok(None)
    }

    /// Find an account or fail with `NotFound`
    pub fn require(&self, identifier: &str) -> JournalResult<Account> {
        self.find(identifier)?
            .ok_or_else(|| JournalError::account_not_found(identifier))
    }

    /// All accounts ordered by id
    pub fn list(&self) -> JournalResult<Vec<Account>> {
        self.storage.accounts.get_all()
    }

    /// Every account with its trade counts, ordered by id
    pub fn summaries(&self) -> JournalResult<Vec<AccountSummary>> {
        self.list()?
            .into_iter()
            .map(|account| {
                let trades = self.storage.trades.get_by_account(account.id)?;
                Ok(AccountSummary {
                    trade_count: trades.len(),
                    open_trades: trades.iter().filter(|t| t.is_open()).count(),
                    realized_pnl: trades.iter().map(|t| t.pnl()).sum(),
                    account,
                })
            })
            .collect()
    }

    /// The active account, falling back to the primary if it vanished
    pub fn active(&self, settings: &Settings) -> JournalResult<Account> {
        if let Some(account) = self.storage.accounts.get(settings.active_account_id)? {
            return Ok(account);
        }
        self.storage
            .accounts
            .get(AccountId::PRIMARY)?
            .ok_or_else(|| JournalError::account_not_found(AccountId::PRIMARY.to_string()))
    }

    /// Replace an account's balance
    pub fn set_balance(&self, id: AccountId, balance: f64) -> JournalResult<Account> {
        let balance = validate_balance(balance)?;
        let mut account = self
            .storage
            .accounts
            .get(id)?
            .ok_or_else(|| JournalError::account_not_found(id.to_string()))?;

        let before = account.clone();
        account.set_balance(balance);

        self.storage.accounts.upsert(account.clone())?;
        self.storage.accounts.save()?;

        self.storage.log_update(
            EntityType::Account,
            account.id.to_string(),
            Some(account.name.clone()),
            &before,
            &account,
        )?;

        Ok(account)
    }

    /// Rename an account
    pub fn rename(&self, id: AccountId, name: &str) -> JournalResult<Account> {
        let name = name.trim();
        if name.is_empty() {
            return Err(JournalError::Validation(
                "Account name cannot be empty".into(),
            ));
        }
        if self.storage.accounts.name_exists(name, Some(id))? {
            return Err(JournalError::Duplicate {
                entity_type: "Account",
                identifier: name.to_string(),
            });
        }

        let mut account = self
            .storage
            .accounts
            .get(id)?
            .ok_or_else(|| JournalError::account_not_found(id.to_string()))?;
        let before = account.clone();
        account.name = name.to_string();
        account
            .validate()
            .map_err(|e| JournalError::Validation(e.to_string()))?;

        self.storage.accounts.upsert(account.clone())?;
        self.storage.accounts.save()?;

        self.storage.log_update(
            EntityType::Account,
            account.id.to_string(),
            Some(account.name.clone()),
            &before,
            &account,
        )?;

        Ok(account)
    }

    /// Make an account the active one and persist the choice
    pub fn switch(&self, settings: &mut Settings, id: AccountId) -> JournalResult<Account> {
        let account = self
            .storage
            .accounts
            .get(id)?
            .ok_or_else(|| JournalError::account_not_found(id.to_string()))?;

        settings.active_account_id = account.id;
        settings.save(self.storage.paths())?;
        info!(account = %account, "Switched active account");

        Ok(account)
    }

    /// Delete an account together with its trades
    ///
    /// The primary account and the last remaining account are refused. If
    /// the deleted account was active, the primary becomes active.
    pub fn delete(&self, settings: &mut Settings, id: AccountId) -> JournalResult<AccountDeletion> {
        if id.is_primary() {
            return Err(JournalError::PrimaryAccount);
        }
        if self.storage.accounts.count()? <= 1 {
            return Err(JournalError::Validation(
                "At least one account must remain".into(),
            ));
        }

        let account = self
            .storage
            .accounts
            .get(id)?
            .ok_or_else(|| JournalError::account_not_found(id.to_string()))?;

        let trades_removed = self.storage.trades.delete_by_account(id)?;
        self.storage.accounts.delete(id)?;
        self.storage.save_all()?;

        let new_active = if settings.active_account_id == id {
            settings.active_account_id = AccountId::PRIMARY;
            settings.save(self.storage.paths())?;
            Some(AccountId::PRIMARY)
        } else {
            None
        };

        self.storage.log_delete(
            EntityType::Account,
            account.id.to_string(),
            Some(account.name.clone()),
            &account,
        )?;
        info!(account = %account, trades_removed, "Deleted account");

        Ok(AccountDeletion {
            account,
            trades_removed,
            new_active,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::JournalPaths;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = JournalPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_create_account() {
        let (_temp_dir, storage) = create_test_storage();
        let service = AccountService::new(&storage);

        let account = service.create("  Futures ", 1234.567).unwrap();
        assert_eq!(account.id, AccountId::new(2));
        assert_eq!(account.name, "Futures");
        assert_eq!(account.balance, 1234.57);
    }

    #[test]
    fn test_create_rejects_bad_input() {
        let (_temp_dir, storage) = create_test_storage();
        let service = AccountService::new(&storage);

        assert!(service.create("", 100.0).unwrap_err().is_validation());
        assert!(service.create("Spot", 0.0).unwrap_err().is_validation());
        assert!(service.create("Spot", -5.0).unwrap_err().is_validation());

        service.create("Spot", 100.0).unwrap();
        assert!(matches!(
            service.create("SPOT", 100.0),
            Err(JournalError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_find_by_name_or_id() {
        let (_temp_dir, storage) = create_test_storage();
        let service = AccountService::new(&storage);
        let created = service.create("My Futures", 10.0).unwrap();

        assert_eq!(service.find("my futures").unwrap().unwrap().id, created.id);
        assert_eq!(service.find("2").unwrap().unwrap().id, created.id);
        assert!(service.require("nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_summaries() {
        let (_temp_dir, storage) = create_test_storage();
        let service = AccountService::new(&storage);
        service.create("Spot", 50.0).unwrap();

        let summaries = service.summaries().unwrap();
        assert_eq!(summaries.len(), 2);
        assert!(summaries[0].account.is_primary());
        assert_eq!(summaries[1].trade_count, 0);
    }

    #[test]
    fn test_set_balance() {
        let (_temp_dir, storage) = create_test_storage();
        let service = AccountService::new(&storage);

        let updated = service.set_balance(AccountId::PRIMARY, 999.999).unwrap();
        assert_eq!(updated.balance, 1000.0);
        assert!(service.set_balance(AccountId::PRIMARY, f64::NAN).is_err());
    }

    #[test]
    fn test_cannot_delete_primary_or_last() {
        let (_temp_dir, storage) = create_test_storage();
        let service = AccountService::new(&storage);
        let mut settings = Settings::default();

        assert!(matches!(
            service.delete(&mut settings, AccountId::PRIMARY),
            Err(JournalError::PrimaryAccount)
        ));
    }

    #[test]
    fn test_delete_active_falls_back_to_primary() {
        let (_temp_dir, storage) = create_test_storage();
        let service = AccountService::new(&storage);
        let mut settings = Settings::default();

        let spot = service.create("Spot", 500.0).unwrap();
        service.switch(&mut settings, spot.id).unwrap();
        assert_eq!(settings.active_account_id, spot.id);

        let deletion = service.delete(&mut settings, spot.id).unwrap();
        assert_eq!(deletion.new_active, Some(AccountId::PRIMARY));
        assert_eq!(settings.active_account_id, AccountId::PRIMARY);
        assert!(service.get(spot.id).unwrap().is_none());
    }

    #[test]
    fn test_active_falls_back_when_missing() {
        let (_temp_dir, storage) = create_test_storage();
        let service = AccountService::new(&storage);
        let settings = Settings {
            active_account_id: AccountId::new(99),
            ..Settings::default()
        };
        assert!(service.active(&settings).unwrap().is_primary());
    }
}
