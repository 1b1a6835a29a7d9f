//! Backup and restore for the trade journal
//!
//! # Archive format
//!
//! Archives are zip files holding:
//! - `data.json`: `{accounts, trades, exportDate, version}`
//! - `images/<slot>_<uid>.<ext>`: raw screenshot bytes
//!
//! Trades inside the archive name their screenshots by filename; in live
//! storage they carry them inline as `data:` URIs.
//!
//! # Restore
//!
//! A restore is destructive and needs a [`RestoreConfirmation`]. It reads and
//! reconciles the archive fully, clears storage, then writes trades in
//! batches. Cancelling between batches saves a [`Checkpoint`] that a later
//! restore of the same archive resumes from.
//!
//! # Example
//!
//! ```rust,ignore
//! use trade_journal::backup::{BackupManager, CancelToken, NoProgress, RestoreConfirmation};
//!
//! let manager = BackupManager::new(paths.clone(), settings.restore.clone());
//! let outcome = manager.restore(
//!     &mut storage,
//!     &mut settings,
//!     archive_path,
//!     RestoreConfirmation::confirmed(),
//!     true,
//!     &CancelToken::new(),
//!     &mut NoProgress,
//! )?;
//! println!("{}", outcome.report().summary());
//! ```

pub mod archive;
mod cancel;
mod checkpoint;
mod manager;
mod pipeline;
mod progress;
mod reader;
mod writer;

pub use archive::{ArchiveDocument, ARCHIVE_VERSION, MAX_ARCHIVE_BYTES};
pub use cancel::CancelToken;
pub use checkpoint::{Checkpoint, CheckpointStore};
pub use manager::{BackupInfo, BackupManager};
pub use pipeline::{
    RecordSink, RestoreConfirmation, RestoreOptions, RestoreOutcome, RestorePipeline,
    RestoreReport, RestoreState,
};
pub use progress::{NoProgress, Progress, ProgressReporter, Stage};
pub use reader::{check_archive_size, reconcile, ArchiveReader, ArchiveSummary, ReconcileReport};
pub use writer::{ArchiveStats, ArchiveWriter, ExportOutcome};
