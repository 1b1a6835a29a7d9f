//! Account repository for JSON storage
//!
//! Manages loading and saving accounts to accounts.json

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::JournalError;
use crate::models::{Account, AccountId};

use super::file_io::{read_json, write_json_atomic};

/// Serializable account data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct AccountData {
    accounts: Vec<Account>,
}

/// Repository for account persistence
pub struct AccountRepository {
    path: PathBuf,
    data: RwLock<HashMap<AccountId, Account>>,
}

impl AccountRepository {
    /// Create a new account repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<AccountId, Account>>, JournalError> {
        self.data
            .read()
            .map_err(|e| JournalError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<AccountId, Account>>, JournalError> {
        self.data
            .write()
            .map_err(|e| JournalError::Storage(format!("Failed to acquire write lock: {}", e)))
    }

    /// Load accounts from disk
    pub fn load(&self) -> Result<(), JournalError> {
        let file_data: AccountData = read_json(&self.path)?;

        let mut data = self.write()?;
        data.clear();
        for account in file_data.accounts {
            data.insert(account.id, account);
        }

        Ok(())
    }

    /// Save accounts to disk, ordered by id
    pub fn save(&self) -> Result<(), JournalError> {
        let file_data = AccountData {
            accounts: self.get_all()?,
        };
        write_json_atomic(&self.path, &file_data)
    }

    /// Get an account by ID
    pub fn get(&self, id: AccountId) -> Result<Option<Account>, JournalError> {
        Ok(self.read()?.get(&id).cloned())
    }

    /// Get all accounts ordered by id
    pub fn get_all(&self) -> Result<Vec<Account>, JournalError> {
        let mut accounts: Vec<_> = self.read()?.values().cloned().collect();
        accounts.sort_by_key(|a| a.id);
        Ok(accounts)
    }

    /// Get an account by name (case-insensitive)
    pub fn get_by_name(&self, name: &str) -> Result<Option<Account>, JournalError> {
        let name_lower = name.trim().to_lowercase();
        Ok(self
            .read()?
            .values()
            .find(|a| a.name.to_lowercase() == name_lower)
            .cloned())
    }

    /// Insert or update an account
    pub fn upsert(&self, account: Account) -> Result<(), JournalError> {
        self.write()?.insert(account.id, account);
        Ok(())
    }

    /// Replace every account with `accounts`
    pub fn replace_all(&self, accounts: Vec<Account>) -> Result<(), JournalError> {
        let mut data = self.write()?;
        data.clear();
        for account in accounts {
            data.insert(account.id, account);
        }
        Ok(())
    }

    /// Delete an account
    pub fn delete(&self, id: AccountId) -> Result<bool, JournalError> {
        Ok(self.write()?.remove(&id).is_some())
    }

    /// Remove every account
    pub fn clear(&self) -> Result<(), JournalError> {
        self.write()?.clear();
        Ok(())
    }

    /// Check if an account exists
    pub fn exists(&self, id: AccountId) -> Result<bool, JournalError> {
        Ok(self.read()?.contains_key(&id))
    }

    /// Check if an account name is already taken
    pub fn name_exists(
        &self,
        name: &str,
        exclude_id: Option<AccountId>,
    ) -> Result<bool, JournalError> {
        let name_lower = name.trim().to_lowercase();
        Ok(self
            .read()?
            .values()
            .any(|a| a.name.to_lowercase() == name_lower && Some(a.id) != exclude_id))
    }

    /// Next free id: one past the current maximum
    pub fn next_id(&self) -> Result<AccountId, JournalError> {
        let max = self.read()?.keys().map(|id| id.get()).max().unwrap_or(0);
        Ok(AccountId::new(max + 1))
    }

    /// Count accounts
    pub fn count(&self) -> Result<usize, JournalError> {
        Ok(self.read()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, AccountRepository) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("accounts.json");
        let repo = AccountRepository::new(path);
        (temp_dir, repo)
    }

    #[test]
    fn test_empty_load() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();
        assert_eq!(repo.count().unwrap(), 0);
        assert_eq!(repo.next_id().unwrap(), AccountId::new(1));
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        repo.load().unwrap();
        repo.upsert(Account::primary()).unwrap();
        repo.upsert(Account::new(AccountId::new(2), "Futures", 2500.0))
            .unwrap();
        repo.save().unwrap();

        let repo2 = AccountRepository::new(temp_dir.path().join("accounts.json"));
        repo2.load().unwrap();

        let all = repo2.get_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, AccountId::PRIMARY);
        assert_eq!(all[1].name, "Futures");
    }

    #[test]
    fn test_next_id_is_max_plus_one() {
        let (_temp_dir, repo) = create_test_repo();
        repo.upsert(Account::primary()).unwrap();
        repo.upsert(Account::new(AccountId::new(7), "Spot", 10.0))
            .unwrap();
        assert_eq!(repo.next_id().unwrap(), AccountId::new(8));
    }

    #[test]
    fn test_name_exists_case_insensitive() {
        let (_temp_dir, repo) = create_test_repo();
        let account = Account::new(AccountId::new(2), "Futures", 10.0);
        repo.upsert(account).unwrap();

        assert!(repo.name_exists("FUTURES", None).unwrap());
        assert!(!repo.name_exists("futures", Some(AccountId::new(2))).unwrap());
        assert!(!repo.name_exists("Spot", None).unwrap());
        assert!(repo.get_by_name(" futures ").unwrap().is_some());
    }

    #[test]
    fn test_delete_and_clear() {
        let (_temp_dir, repo) = create_test_repo();
        repo.upsert(Account::primary()).unwrap();
        repo.upsert(Account::new(AccountId::new(2), "Futures", 10.0))
            .unwrap();

        assert!(repo.delete(AccountId::new(2)).unwrap());
        assert!(!repo.delete(AccountId::new(2)).unwrap());
        assert_eq!(repo.count().unwrap(), 1);

        repo.clear().unwrap();
        assert_eq!(repo.count().unwrap(), 0);
    }
}
