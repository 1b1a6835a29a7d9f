//! Resume position for interrupted restores
//!
//! The checkpoint is advisory: a missing or unreadable file simply means a
//! restore starts from the beginning.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::JournalResult;
use crate::storage::file_io::write_json_atomic;

/// Where an interrupted restore stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    /// Start index of the first batch not yet written
    #[serde(rename = "lastIndex")]
    pub index: usize,
    /// Number of trades in the archive being restored
    #[serde(rename = "totalTrades")]
    pub total: usize,
    /// SHA-256 of the archive's data.json, hex encoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl Checkpoint {
    pub fn new(index: usize, total: usize, archive_digest: Option<String>) -> Self {
        Self {
            index,
            total,
            archive_digest,
            saved_at: Some(Utc::now()),
        }
    }

    /// Whether this checkpoint can resume a restore of `total` trades
    ///
    /// Totals must match; digests must match when both sides have one.
    pub fn applies_to(&self, total: usize, digest: Option<&str>) -> bool {
        if self.total != total || self.index >= total {
            return false;
        }
        match (self.archive_digest.as_deref(), digest) {
            (Some(saved), Some(current)) => saved == current,
            _ => true,
        }
    }
}

/// File-backed checkpoint storage
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Persist a checkpoint
    pub fn save(&self, checkpoint: &Checkpoint) -> JournalResult<()> {
        debug!(
            index = checkpoint.index,
            total = checkpoint.total,
            "Saving restore checkpoint"
        );
        write_json_atomic(&self.path, checkpoint)
    }

    /// Read the checkpoint, treating absent or corrupt data as none
    pub fn load(&self) -> Option<Checkpoint> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Could not read restore checkpoint");
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(checkpoint) => Some(checkpoint),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring corrupt restore checkpoint");
                None
            }
        }
    }

    /// Remove the checkpoint; failures are logged, never returned
    pub fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Cleared restore checkpoint"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Could not clear restore checkpoint"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, CheckpointStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(temp_dir.path().join("restore_checkpoint.json"));
        (temp_dir, store)
    }

    #[test]
    fn test_save_load_clear() {
        let (_temp_dir, store) = store();
        assert!(store.load().is_none());

        let checkpoint = Checkpoint::new(10, 50, Some("abc".into()));
        store.save(&checkpoint).unwrap();
        assert_eq!(store.load().unwrap(), checkpoint);

        store.clear();
        assert!(store.load().is_none());
        store.clear();
    }

    #[test]
    fn test_corrupt_checkpoint_is_absent() {
        let (temp_dir, store) = store();
        fs::write(temp_dir.path().join("restore_checkpoint.json"), "{not json").unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_reads_legacy_shape() {
        let (temp_dir, store) = store();
        fs::write(
            temp_dir.path().join("restore_checkpoint.json"),
            r#"{"lastIndex": 15, "totalTrades": 40}"#,
        )
        .unwrap();
        let checkpoint = store.load().unwrap();
        assert_eq!(checkpoint.index, 15);
        assert!(checkpoint.applies_to(40, Some("anything")));
    }

    #[test]
    fn test_applies_to() {
        let checkpoint = Checkpoint::new(10, 50, Some("abc".into()));
        assert!(checkpoint.applies_to(50, Some("abc")));
        assert!(checkpoint.applies_to(50, None));
        assert!(!checkpoint.applies_to(37, Some("abc")));
        assert!(!checkpoint.applies_to(50, Some("def")));
        assert!(!Checkpoint::new(50, 50, None).applies_to(50, None));
    }
}
