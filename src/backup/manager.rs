//! Backup manager
//!
//! Ties the archive writer and the restore pipeline to the journal's storage:
//! exports, safety archives taken before a restore with their retention, and
//! the bookkeeping a restore needs afterwards.

use std::fs;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use tracing::{info, warn};

use crate::audit::AuditEntry;
use crate::config::paths::JournalPaths;
use crate::config::settings::{RestoreSettings, Settings};
use crate::error::{JournalError, JournalResult};
use crate::models::AccountId;
use crate::storage::Storage;

use super::cancel::CancelToken;
use super::checkpoint::CheckpointStore;
use super::pipeline::{RestoreConfirmation, RestoreOptions, RestoreOutcome, RestorePipeline};
use super::progress::{NoProgress, ProgressReporter};
use super::reader::{ArchiveReader, ArchiveSummary};
use super::writer::{ArchiveWriter, ExportOutcome};

const SAFETY_PREFIX: &str = "pre-restore-";

/// Metadata about a safety archive
#[derive(Debug, Clone)]
pub struct BackupInfo {
    /// Backup filename
    pub filename: String,
    /// Full path to backup
    pub path: PathBuf,
    /// When the backup was created
    pub created_at: DateTime<Utc>,
    /// Size in bytes
    pub size_bytes: u64,
}

/// Manages exports, restores and safety archives
pub struct BackupManager {
    backup_dir: PathBuf,
    paths: JournalPaths,
    settings: RestoreSettings,
}

impl BackupManager {
    pub fn new(paths: JournalPaths, settings: RestoreSettings) -> Self {
        Self {
            backup_dir: paths.backup_dir(),
            paths,
            settings,
        }
    }

    /// Get backup directory path
    pub fn backup_dir(&self) -> &PathBuf {
        &self.backup_dir
    }

    fn writer(&self) -> ArchiveWriter {
        ArchiveWriter::from_settings(&self.settings)
    }

    /// Checkpoint store used by restores
    pub fn checkpoints(&self) -> CheckpointStore {
        CheckpointStore::new(self.paths.checkpoint_file())
    }

    /// Export every account and trade into `dir`
    pub fn export(
        &self,
        storage: &Storage,
        dir: &Path,
        cancel: &CancelToken,
        progress: &mut dyn ProgressReporter,
    ) -> JournalResult<ExportOutcome> {
        let accounts = storage.accounts.get_all()?;
        let trades = storage.trades.get_all()?;
        self.writer()
            .export_to_dir(&accounts, &trades, dir, cancel, progress)
    }

    /// Archive the current journal into the backup directory
    ///
    /// Returns the path to the created archive.
    pub fn create_safety_backup(&self, storage: &Storage) -> JournalResult<PathBuf> {
        fs::create_dir_all(&self.backup_dir)?;

        let now = Utc::now();
        let filename = format!(
            "{}{}-{:03}.zip",
            SAFETY_PREFIX,
            now.format("%Y%m%d-%H%M%S"),
            now.timestamp_subsec_millis()
        );
        let path = self.backup_dir.join(filename);

        let accounts = storage.accounts.get_all()?;
        let trades = storage.trades.get_all()?;
        match self.writer().write_file(
            &accounts,
            &trades,
            &path,
            &CancelToken::new(),
            &mut NoProgress,
        )? {
            ExportOutcome::Completed { path, .. } => {
                info!(path = %path.display(), "Created safety backup");
                Ok(path)
            }
            ExportOutcome::Cancelled => Err(JournalError::Storage(
                "Safety backup was interrupted".into(),
            )),
        }
    }

    /// List safety archives, newest first
    pub fn list_backups(&self) -> JournalResult<Vec<BackupInfo>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();
        for entry in fs::read_dir(&self.backup_dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "zip") {
                if let Some(info) = parse_backup_info(&path) {
                    backups.push(info);
                }
            }
        }

        backups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(backups)
    }

    /// Get the most recent safety archive
    pub fn get_latest_backup(&self) -> JournalResult<Option<BackupInfo>> {
        Ok(self.list_backups()?.into_iter().next())
    }

    /// Delete safety archives beyond the configured count
    pub fn enforce_retention(&self) -> JournalResult<Vec<PathBuf>> {
        let mut deleted = Vec::new();
        for backup in self
            .list_backups()?
            .into_iter()
            .skip(self.settings.keep_safety_backups)
        {
            fs::remove_file(&backup.path)?;
            deleted.push(backup.path);
        }
        Ok(deleted)
    }

    /// Summarize an archive without restoring it
    pub fn inspect(&self, archive: &Path) -> JournalResult<ArchiveSummary> {
        ArchiveReader::open(archive)?.summary()
    }

    /// Whether a saved checkpoint will resume a restore of this archive
    fn will_resume<R: Read + Seek>(&self, reader: &mut ArchiveReader<R>) -> JournalResult<bool> {
        let Some(checkpoint) = self.checkpoints().load() else {
            return Ok(false);
        };
        let (document, digest) = reader.read_document()?;
        Ok(checkpoint.applies_to(document.trades.len(), Some(digest.as_str())))
    }

    /// Replace the journal with the contents of `archive`
    ///
    /// A safety backup is taken first unless this run resumes an interrupted
    /// restore, whose safety backup already holds the journal as it was.
    /// Storage is reloaded from disk afterwards whatever the outcome, and the
    /// active account falls back to the primary if the archive lacks it.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        &self,
        storage: &mut Storage,
        settings: &mut Settings,
        archive: &Path,
        confirmation: RestoreConfirmation,
        safety_backup: bool,
        cancel: &CancelToken,
        progress: &mut dyn ProgressReporter,
    ) -> JournalResult<RestoreOutcome> {
        let mut reader = ArchiveReader::open(archive)?;

        if safety_backup && !self.will_resume(&mut reader)? {
            self.create_safety_backup(storage)?;
            let deleted = self.enforce_retention()?;
            if !deleted.is_empty() {
                info!(count = deleted.len(), "Removed old safety backups");
            }
        }

        let mut pipeline =
            RestorePipeline::new(self.checkpoints(), RestoreOptions::from_settings(&self.settings));
        let result = pipeline.restore(reader, storage, confirmation, cancel, progress);

        storage.load_all()?;
        if !storage.accounts.exists(settings.active_account_id)? {
            warn!(
                account = %settings.active_account_id,
                "Active account missing after restore, switching to primary"
            );
            settings.active_account_id = AccountId::PRIMARY;
            settings.save(&self.paths)?;
        }

        let outcome = result?;
        let source = archive
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| archive.display().to_string());
        let summary = match &outcome {
            RestoreOutcome::Completed(report) => report.summary(),
            RestoreOutcome::Cancelled { report, .. } => format!("cancelled: {}", report.summary()),
        };
        storage.audit().log(&AuditEntry::restore(source, summary))?;

        Ok(outcome)
    }
}

/// Parse backup info from a safety archive path
fn parse_backup_info(path: &Path) -> Option<BackupInfo> {
    let filename = path.file_name()?.to_string_lossy().to_string();
    let stamp = filename.strip_prefix(SAFETY_PREFIX)?.strip_suffix(".zip")?;
    let created_at = parse_backup_timestamp(stamp)?;
    let size_bytes = fs::metadata(path).ok()?.len();

    Some(BackupInfo {
        filename,
        path: path.to_path_buf(),
        created_at,
        size_bytes,
    })
}

/// Parse `YYYYMMDD-HHMMSS` with an optional `-mmm` millisecond suffix
fn parse_backup_timestamp(stamp: &str) -> Option<DateTime<Utc>> {
    let mut parts = stamp.split('-');
    let date = parts.next()?;
    let time = parts.next()?;
    let millis: u32 = match parts.next() {
        Some(ms) => ms.parse().ok()?,
        None => 0,
    };
    if parts.next().is_some()
        || time.len() != 6
        || !time.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let date = NaiveDate::parse_from_str(date, "%Y%m%d").ok()?;
    let hour: u32 = time[0..2].parse().ok()?;
    let minute: u32 = time[2..4].parse().ok()?;
    let second: u32 = time[4..6].parse().ok()?;
    let time = NaiveTime::from_hms_milli_opt(hour, minute, second, millis)?;
    Some(NaiveDateTime::new(date, time).and_utc())
}
