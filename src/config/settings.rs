//! User settings for the trade journal
//!
//! Manages user preferences including the active account, restore batching,
//! archive compression and the optional storage quota.

use serde::{Deserialize, Serialize};

use super::paths::JournalPaths;
use crate::error::JournalError;
use crate::models::AccountId;

/// Restore pipeline tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreSettings {
    /// Number of trades written per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Deflate level used when writing archives (0-9)
    #[serde(default = "default_compression_level")]
    pub compression_level: i64,

    /// Safety archives taken before a restore that are kept
    #[serde(default = "default_keep_safety_backups")]
    pub keep_safety_backups: usize,
}

fn default_batch_size() -> usize {
    5
}

fn default_compression_level() -> i64 {
    6
}

fn default_keep_safety_backups() -> usize {
    5
}

impl Default for RestoreSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            compression_level: default_compression_level(),
            keep_safety_backups: default_keep_safety_backups(),
        }
    }
}

/// User settings for the trade journal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Account that new trades are recorded against
    #[serde(default = "default_active_account")]
    pub active_account_id: AccountId,

    /// Restore and archive settings
    #[serde(default)]
    pub restore: RestoreSettings,

    /// Upper bound on the size of stored trade data, in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_quota_bytes: Option<u64>,

    /// Default currency symbol
    #[serde(default = "default_currency")]
    pub currency_symbol: String,

    /// Fee percent applied when a trade is opened without one
    #[serde(default)]
    pub default_fee_percent: f64,
}

fn default_schema_version() -> u32 {
    1
}

fn default_active_account() -> AccountId {
    AccountId::PRIMARY
}

fn default_currency() -> String {
    "$".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            active_account_id: default_active_account(),
            restore: RestoreSettings::default(),
            storage_quota_bytes: None,
            currency_symbol: default_currency(),
            default_fee_percent: 0.0,
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &JournalPaths) -> Result<Self, JournalError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                JournalError::Io(format!("Failed to read settings file: {}", e))
            })?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                JournalError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &JournalPaths) -> Result<(), JournalError> {
        paths.ensure_directories()?;

        let settings_path = paths.settings_file();
        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            JournalError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(&settings_path, contents).map_err(|e| {
            JournalError::Io(format!("Failed to write settings file: {}", e))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.active_account_id, AccountId::PRIMARY);
        assert_eq!(settings.restore.batch_size, 5);
        assert_eq!(settings.restore.compression_level, 6);
        assert!(settings.storage_quota_bytes.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = JournalPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.active_account_id = AccountId::new(3);
        settings.restore.batch_size = 20;
        settings.storage_quota_bytes = Some(4096);

        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.active_account_id, AccountId::new(3));
        assert_eq!(loaded.restore.batch_size, 20);
        assert_eq!(loaded.storage_quota_bytes, Some(4096));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.active_account_id, AccountId::PRIMARY);
        assert_eq!(settings.currency_symbol, "$");
    }
}
