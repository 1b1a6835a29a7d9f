//! Storage initialization
//!
//! First-run setup: directories, default settings and the primary account.

use tracing::info;

use crate::config::paths::JournalPaths;
use crate::config::settings::Settings;
use crate::error::JournalError;
use crate::models::Account;

use super::accounts::AccountRepository;

/// Initialize storage for a fresh installation
///
/// Safe to run repeatedly; existing settings and accounts are left alone.
pub fn initialize_storage(paths: &JournalPaths) -> Result<(), JournalError> {
    paths.ensure_directories()?;

    if !paths.settings_file().exists() {
        Settings::default().save(paths)?;
    }

    let accounts = AccountRepository::new(paths.accounts_file());
    accounts.load()?;
    if ensure_primary_account(&accounts)? {
        accounts.save()?;
    }

    Ok(())
}

/// Create the primary account when none exists, returning whether it did
pub fn ensure_primary_account(accounts: &AccountRepository) -> Result<bool, JournalError> {
    if accounts.count()? > 0 {
        return Ok(false);
    }

    let primary = Account::primary();
    info!(account = %primary, "Creating primary account");
    accounts.upsert(primary)?;
    Ok(true)
}

/// Check if storage needs initialization
pub fn needs_initialization(paths: &JournalPaths) -> bool {
    !paths.settings_file().exists() || !paths.accounts_file().exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountId, PRIMARY_ACCOUNT_NAME};
    use tempfile::TempDir;

    #[test]
    fn test_initialize_storage() {
        let temp_dir = TempDir::new().unwrap();
        let paths = JournalPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert!(needs_initialization(&paths));
        initialize_storage(&paths).unwrap();
        assert!(!needs_initialization(&paths));
        assert!(paths.backup_dir().exists());

        let accounts = AccountRepository::new(paths.accounts_file());
        accounts.load().unwrap();
        let primary = accounts.get(AccountId::PRIMARY).unwrap().unwrap();
        assert_eq!(primary.name, PRIMARY_ACCOUNT_NAME);
        assert_eq!(primary.balance, 0.0);
    }

    #[test]
    fn test_does_not_overwrite_accounts() {
        let temp_dir = TempDir::new().unwrap();
        let paths = JournalPaths::with_base_dir(temp_dir.path().to_path_buf());
        initialize_storage(&paths).unwrap();

        let accounts = AccountRepository::new(paths.accounts_file());
        accounts.load().unwrap();
        let mut primary = accounts.get(AccountId::PRIMARY).unwrap().unwrap();
        primary.set_balance(5000.0);
        accounts.upsert(primary).unwrap();
        accounts.save().unwrap();

        initialize_storage(&paths).unwrap();

        accounts.load().unwrap();
        assert_eq!(
            accounts.get(AccountId::PRIMARY).unwrap().unwrap().balance,
            5000.0
        );
    }
}
