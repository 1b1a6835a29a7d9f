//! Archive writer
//!
//! Serializes accounts and trades into a zip archive. Inline screenshots are
//! moved out of the JSON into `images/` and the trades keep only filenames.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, SecondsFormat, Utc};
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::config::settings::RestoreSettings;
use crate::error::{JournalError, JournalResult};
use crate::models::{Account, ImageSlot, InlineImage, Trade};
use crate::storage::file_io::temp_path_for;

use super::archive::{
    archive_file_name, image_entry_path, ArchiveDocument, ARCHIVE_VERSION, DATA_FILE, IMAGES_DIR,
};
use super::cancel::CancelToken;
use super::progress::{ProgressReporter, Stage, Throughput};

/// What an archive holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveStats {
    pub accounts: usize,
    pub trades: usize,
    pub images: usize,
}

/// Result of an export
#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    Completed { path: PathBuf, stats: ArchiveStats },
    /// Stopped on request; no file was left behind
    Cancelled,
}

/// Writes journal archives
#[derive(Debug, Clone)]
pub struct ArchiveWriter {
    compression_level: i64,
}

impl Default for ArchiveWriter {
    fn default() -> Self {
        Self::from_settings(&RestoreSettings::default())
    }
}

impl ArchiveWriter {
    pub fn new(compression_level: i64) -> Self {
        Self {
            compression_level: compression_level.clamp(0, 9),
        }
    }

    pub fn from_settings(settings: &RestoreSettings) -> Self {
        Self::new(settings.compression_level)
    }

    fn options(&self) -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(self.compression_level))
    }

    /// Export into `dir` as `crypto-journal-<today>.zip`
    pub fn export_to_dir(
        &self,
        accounts: &[Account],
        trades: &[Trade],
        dir: &Path,
        cancel: &CancelToken,
        progress: &mut dyn ProgressReporter,
    ) -> JournalResult<ExportOutcome> {
        let path = dir.join(archive_file_name(Local::now().date_naive()));
        self.write_file(accounts, trades, &path, cancel, progress)
    }

    /// Export to `path`, replacing it only once the archive is complete
    pub fn write_file(
        &self,
        accounts: &[Account],
        trades: &[Trade],
        path: &Path,
        cancel: &CancelToken,
        progress: &mut dyn ProgressReporter,
    ) -> JournalResult<ExportOutcome> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = temp_path_for(path);
        let file = File::create(&temp_path)?;

        let result = self
            .write_to(BufWriter::new(file), accounts, trades, cancel, progress)
            .and_then(|written| match written {
                Some((writer, stats)) => {
                    let file = writer
                        .into_inner()
                        .map_err(|e| JournalError::from(e.into_error()))?;
                    file.sync_all()?;
                    Ok(Some(stats))
                }
                None => Ok(None),
            });

        match result {
            Ok(Some(stats)) => {
                fs::rename(&temp_path, path)?;
                info!(
                    path = %path.display(),
                    trades = stats.trades,
                    images = stats.images,
                    "Exported archive"
                );
                Ok(ExportOutcome::Completed {
                    path: path.to_path_buf(),
                    stats,
                })
            }
            Ok(None) => {
                let _ = fs::remove_file(&temp_path);
                info!("Export cancelled");
                Ok(ExportOutcome::Cancelled)
            }
            Err(e) => {
                let _ = fs::remove_file(&temp_path);
                Err(e)
            }
        }
    }

    /// Write an archive to any seekable writer
    ///
    /// Returns the writer back with the archive stats, or `None` when
    /// cancelled between image writes.
    pub fn write_to<W: Write + Seek>(
        &self,
        writer: W,
        accounts: &[Account],
        trades: &[Trade],
        cancel: &CancelToken,
        progress: &mut dyn ProgressReporter,
    ) -> JournalResult<Option<(W, ArchiveStats)>> {
        let (document, images) = split_images(accounts, trades);
        let options = self.options();
        let mut zip = ZipWriter::new(writer);

        let json = serde_json::to_vec_pretty(&document)?;
        zip.start_file(DATA_FILE, options)?;
        zip.write_all(&json)?;
        zip.add_directory(IMAGES_DIR, options)?;

        let throughput = Throughput::start();
        let total = images.len();
        for (done, (name, image)) in images.iter().enumerate() {
            if cancel.is_cancelled() {
                return Ok(None);
            }
            zip.start_file(image_entry_path(name), options)?;
            zip.write_all(&image.bytes)?;
            progress.report(&throughput.progress(Stage::WritingImages, done + 1, total));
        }

        let writer = zip.finish()?;
        let stats = ArchiveStats {
            accounts: document.accounts.len(),
            trades: document.trades.len(),
            images: total,
        };
        debug!(?stats, "Archive written");
        Ok(Some((writer, stats)))
    }
}

/// Replace inline screenshots with filenames, collecting the decoded images
fn split_images(accounts: &[Account], trades: &[Trade]) -> (ArchiveDocument, Vec<(String, InlineImage)>) {
    let mut images = Vec::new();
    let mut seen = HashSet::new();
    let mut archived = Vec::with_capacity(trades.len());

    for trade in trades {
        let mut trade = trade.clone();
        trade.uid = trade.effective_uid();

        for slot in [ImageSlot::Entry, ImageSlot::Exit] {
            let Some(reference) = trade.image(slot) else {
                continue;
            };

            match InlineImage::from_data_uri(reference) {
                Ok(image) => {
                    let name = slot.file_name(&trade.uid, image.extension());
                    trade.set_image(slot, Some(name.clone()), Some(name.clone()));
                    if seen.insert(name.clone()) {
                        images.push((name, image));
                    }
                }
                Err(e) => {
                    warn!(
                        trade = %trade.uid,
                        slot = %slot,
                        error = %e,
                        "Dropping screenshot without inline image data"
                    );
                    trade.set_image(slot, None, None);
                }
            }
        }

        archived.push(trade);
    }

    let document = ArchiveDocument {
        accounts: accounts.to_vec(),
        trades: archived,
        export_date: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        version: Some(ARCHIVE_VERSION.to_string()),
    };
    (document, images)
}
