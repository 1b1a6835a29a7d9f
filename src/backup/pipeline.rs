//! Batched restore pipeline
//!
//! Reads an archive, reattaches its images, then replaces the journal's
//! records batch by batch. Cancellation between batches leaves a checkpoint
//! that a later restore of the same archive resumes from.

use std::fmt;
use std::io::{Read, Seek};
use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::config::settings::RestoreSettings;
use crate::error::{JournalError, JournalResult};
use crate::models::{Account, AccountId, Trade};
use crate::storage::Storage;

use super::checkpoint::{Checkpoint, CheckpointStore};
use super::progress::{Progress, ProgressReporter, Stage, Throughput};
use super::reader::{reconcile, ArchiveReader, ReconcileReport};
use super::CancelToken;

/// Destination of restored records
///
/// Trades are staged with `put_trade` and become durable on `commit`.
pub trait RecordSink {
    /// Remove every account and trade
    fn clear_all(&mut self) -> JournalResult<()>;

    /// Replace all accounts, keeping the primary account present
    fn put_accounts(&mut self, accounts: Vec<Account>) -> JournalResult<()>;

    /// Stage one trade
    ///
    /// Fails with `QuotaExceeded` when storage is full and with
    /// `RecordWrite` for any other problem with this record.
    fn put_trade(&mut self, trade: Trade) -> JournalResult<()>;

    /// Persist staged trades
    fn commit(&mut self) -> JournalResult<()>;

    /// Drop trades staged since the last commit
    fn discard_uncommitted(&mut self) -> JournalResult<()>;
}

impl RecordSink for Storage {
    fn clear_all(&mut self) -> JournalResult<()> {
        self.trades.clear()?;
        self.accounts.clear()?;
        self.save_all()
    }

    fn put_accounts(&mut self, accounts: Vec<Account>) -> JournalResult<()> {
        self.accounts.replace_all(accounts)?;
        if !self.accounts.exists(AccountId::PRIMARY)? {
            warn!("Archive has no primary account, recreating it");
            self.accounts.upsert(Account::primary())?;
        }
        self.accounts.save()
    }

    fn put_trade(&mut self, trade: Trade) -> JournalResult<()> {
        let record = trade.uid.to_string();
        self.trades.upsert(trade).map_err(|e| match e {
            JournalError::QuotaExceeded(_) => e,
            other => JournalError::RecordWrite {
                record,
                reason: other.to_string(),
            },
        })
    }

    fn commit(&mut self) -> JournalResult<()> {
        self.trades.save()
    }

    fn discard_uncommitted(&mut self) -> JournalResult<()> {
        self.trades.load().map(|_| ())
    }
}

/// Where a restore is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreState {
    Idle,
    ReadingArchive,
    ReconcilingImages,
    WritingBatches { next_index: usize, total: usize },
    Completed,
    Cancelled,
    Failed,
}

impl fmt::Display for RestoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::ReadingArchive => write!(f, "reading archive"),
            Self::ReconcilingImages => write!(f, "reconciling images"),
            Self::WritingBatches { next_index, total } => {
                write!(f, "writing trades {}/{}", next_index, total)
            }
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Proof that the caller accepted a destructive restore
#[derive(Debug)]
pub struct RestoreConfirmation(());

impl RestoreConfirmation {
    /// The caller has confirmed the restore
    pub fn confirmed() -> Self {
        Self(())
    }

    /// Turn a yes/no answer into a confirmation
    pub fn from_answer(confirmed: bool) -> JournalResult<Self> {
        if confirmed {
            Ok(Self(()))
        } else {
            Err(JournalError::ConfirmationRequired(
                "restoring replaces every account and trade".into(),
            ))
        }
    }
}

/// Restore tuning
#[derive(Debug, Clone, Copy)]
pub struct RestoreOptions {
    pub batch_size: usize,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        Self::from_settings(&RestoreSettings::default())
    }
}

impl RestoreOptions {
    pub fn from_settings(settings: &RestoreSettings) -> Self {
        Self {
            batch_size: settings.batch_size.max(1),
        }
    }
}

/// What a restore did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub accounts: usize,
    /// Trades in the archive
    pub total: usize,
    /// Trades written by this run
    pub written: usize,
    /// Uids of trades that could not be written
    pub skipped: Vec<String>,
    /// Batch index this run resumed from
    pub resumed_from: Option<usize>,
    pub images: ReconcileReport,
}

impl RestoreReport {
    pub fn summary(&self) -> String {
        let mut parts = vec![format!(
            "{} accounts, {} of {} trades written",
            self.accounts, self.written, self.total
        )];
        if let Some(index) = self.resumed_from {
            parts.push(format!("resumed at trade {}", index));
        }
        if !self.skipped.is_empty() {
            parts.push(format!("{} skipped", self.skipped.len()));
        }
        parts.push(format!("{} images restored", self.images.restored));
        if !self.images.missing.is_empty() {
            parts.push(format!("{} images missing", self.images.missing.len()));
        }
        parts.join(", ")
    }
}

/// How a restore ended, short of failing
#[derive(Debug, Clone, PartialEq)]
pub enum RestoreOutcome {
    Completed(RestoreReport),
    /// Stopped on request; `checkpoint` is set once writing had started
    Cancelled {
        checkpoint: Option<Checkpoint>,
        report: RestoreReport,
    },
}

impl RestoreOutcome {
    pub fn report(&self) -> &RestoreReport {
        match self {
            Self::Completed(report) => report,
            Self::Cancelled { report, .. } => report,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Runs restores against a checkpoint store
pub struct RestorePipeline {
    checkpoints: CheckpointStore,
    options: RestoreOptions,
    state: RestoreState,
}

impl RestorePipeline {
    pub fn new(checkpoints: CheckpointStore, options: RestoreOptions) -> Self {
        Self {
            checkpoints,
            options,
            state: RestoreState::Idle,
        }
    }

    pub fn state(&self) -> RestoreState {
        self.state
    }

    fn enter(&mut self, state: RestoreState) {
        debug!(from = %self.state, to = %state, "Restore state change");
        self.state = state;
    }

    fn fail(&mut self, err: JournalError) -> JournalError {
        self.enter(RestoreState::Failed);
        err
    }

    /// Restore from an archive file
    pub fn restore_file<S: RecordSink>(
        &mut self,
        path: &Path,
        sink: &mut S,
        confirmation: RestoreConfirmation,
        cancel: &CancelToken,
        progress: &mut dyn ProgressReporter,
    ) -> JournalResult<RestoreOutcome> {
        self.enter(RestoreState::ReadingArchive);
        let reader = ArchiveReader::open(path).map_err(|e| self.fail(e))?;
        self.restore(reader, sink, confirmation, cancel, progress)
    }

    /// Restore from an opened archive
    pub fn restore<R: Read + Seek, S: RecordSink>(
        &mut self,
        mut reader: ArchiveReader<R>,
        sink: &mut S,
        _confirmation: RestoreConfirmation,
        cancel: &CancelToken,
        progress: &mut dyn ProgressReporter,
    ) -> JournalResult<RestoreOutcome> {
        self.enter(RestoreState::ReadingArchive);
        let (document, digest) = reader.read_document().map_err(|e| self.fail(e))?;

        let images = match reader
            .read_images(cancel, progress)
            .map_err(|e| self.fail(e))?
        {
            Some(images) => images,
            None => return Ok(self.cancelled_before_writing()),
        };

        self.enter(RestoreState::ReconcilingImages);
        let mut trades = document.trades;
        let image_report = reconcile(&mut trades, &images);
        drop(images);
        progress.report(&Progress {
            stage: Stage::Reconciling,
            done: trades.len(),
            total: trades.len(),
            eta: None,
        });

        let total = trades.len();
        let mut report = RestoreReport {
            accounts: document.accounts.len(),
            total,
            images: image_report,
            ..RestoreReport::default()
        };

        let start = match self.checkpoints.load() {
            Some(checkpoint) if checkpoint.applies_to(total, Some(digest.as_str())) => {
                info!(index = checkpoint.index, total, "Resuming restore from checkpoint");
                Some(checkpoint.index)
            }
            Some(checkpoint) => {
                info!(
                    saved_total = checkpoint.total,
                    total, "Ignoring checkpoint for a different archive"
                );
                None
            }
            None => None,
        };

        if cancel.is_cancelled() {
            return Ok(self.cancelled_before_writing());
        }

        match start {
            Some(_) => report.resumed_from = start,
            None => {
                warn!("Clearing all accounts and trades before restore");
                sink.clear_all().map_err(|e| self.fail(e))?;
            }
        }
        sink.put_accounts(document.accounts)
            .map_err(|e| self.fail(e))?;

        let start = start.unwrap_or(0);
        let batch_size = self.options.batch_size.max(1);
        let throughput = Throughput::start();

        let mut index = start;
        while index < total {
            self.enter(RestoreState::WritingBatches {
                next_index: index,
                total,
            });

            if cancel.is_cancelled() {
                let checkpoint = Checkpoint::new(index, total, Some(digest.clone()));
                self.checkpoints
                    .save(&checkpoint)
                    .map_err(|e| self.fail(e))?;
                self.enter(RestoreState::Cancelled);
                info!(index, total, "Restore cancelled, checkpoint saved");
                return Ok(RestoreOutcome::Cancelled {
                    checkpoint: Some(checkpoint),
                    report,
                });
            }

            let end = (index + batch_size).min(total);
            self.write_batch(sink, &trades[index..end], &mut report)?;

            progress.report(&Progress {
                stage: Stage::WritingTrades,
                done: end,
                total,
                eta: throughput.eta(end - start, total - start),
            });
            index = end;
        }

        self.checkpoints.clear();
        self.enter(RestoreState::Completed);
        info!(summary = %report.summary(), "Restore completed");
        Ok(RestoreOutcome::Completed(report))
    }

    fn write_batch<S: RecordSink>(
        &mut self,
        sink: &mut S,
        batch: &[Trade],
        report: &mut RestoreReport,
    ) -> JournalResult<()> {
        for trade in batch {
            match sink.put_trade(trade.clone()) {
                Ok(()) => report.written += 1,
                Err(e) if e.is_fatal() => return Err(self.abort_batch(sink, e)),
                Err(e) => {
                    warn!(trade = %trade.uid, error = %e, "Skipping trade that could not be written");
                    report.skipped.push(trade.uid.to_string());
                }
            }
        }

        if let Err(e) = sink.commit() {
            return Err(self.abort_batch(sink, e));
        }
        Ok(())
    }

    fn abort_batch<S: RecordSink>(&mut self, sink: &mut S, err: JournalError) -> JournalError {
        if let Err(discard) = sink.discard_uncommitted() {
            error!(error = %discard, "Failed to discard partial batch");
        }
        error!(error = %err, "Restore aborted");
        self.fail(err)
    }

    fn cancelled_before_writing(&mut self) -> RestoreOutcome {
        self.enter(RestoreState::Cancelled);
        info!("Restore cancelled before any record was written");
        RestoreOutcome::Cancelled {
            checkpoint: None,
            report: RestoreReport::default(),
        }
    }
}
