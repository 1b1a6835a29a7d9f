//! Archive reader
//!
//! Opens a journal archive, parses `data.json`, decodes the image entries
//! and reattaches them to the trades that reference them.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use tracing::{debug, warn};
use zip::ZipArchive;

use crate::error::{JournalError, JournalResult};
use crate::models::{ImageSlot, InlineImage, Trade, TradeUid};

use super::archive::{document_digest, ArchiveDocument, DATA_FILE, IMAGES_DIR, MAX_ARCHIVE_BYTES};
use super::cancel::CancelToken;
use super::progress::{ProgressReporter, Stage, Throughput};

/// Upper bound on the buffer reserved from an entry's declared size
const MAX_IMAGE_PREALLOC: u64 = 16 * 1024 * 1024;

/// Refuse archives larger than the accepted maximum
pub fn check_archive_size(size: u64) -> JournalResult<()> {
    if size > MAX_ARCHIVE_BYTES {
        return Err(JournalError::ArchiveTooLarge {
            size,
            max: MAX_ARCHIVE_BYTES,
        });
    }
    Ok(())
}

/// Headline numbers of an archive, read without decoding images
#[derive(Debug, Clone)]
pub struct ArchiveSummary {
    pub size_bytes: u64,
    pub accounts: usize,
    pub trades: usize,
    pub open_trades: usize,
    pub images: usize,
    pub export_date: Option<String>,
    pub version: Option<String>,
}

impl ArchiveSummary {
    /// Format for terminal output
    pub fn format_terminal(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("{:<14} {}\n", "Size:", format_bytes(self.size_bytes)));
        output.push_str(&format!(
            "{:<14} {}\n",
            "Exported:",
            self.export_date.as_deref().unwrap_or("unknown")
        ));
        output.push_str(&format!(
            "{:<14} {}\n",
            "Version:",
            self.version.as_deref().unwrap_or("unknown")
        ));
        output.push_str(&format!("{:<14} {}\n", "Accounts:", self.accounts));
        output.push_str(&format!(
            "{:<14} {} ({} open)\n",
            "Trades:", self.trades, self.open_trades
        ));
        output.push_str(&format!("{:<14} {}\n", "Images:", self.images));
        output
    }
}

fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let b = bytes as f64;
    if b >= KIB * KIB {
        format!("{:.1} MB", b / (KIB * KIB))
    } else if b >= KIB {
        format!("{:.1} KB", b / KIB)
    } else {
        format!("{} B", bytes)
    }
}

/// Reads journal archives
pub struct ArchiveReader<R: Read + Seek> {
    archive: ZipArchive<R>,
    size_bytes: u64,
}

impl ArchiveReader<BufReader<File>> {
    /// Open an archive file, checking its size before reading anything
    pub fn open(path: &Path) -> JournalResult<Self> {
        let size = fs::metadata(path)?.len();
        check_archive_size(size)?;

        let file = File::open(path)?;
        let mut reader = Self::new(BufReader::new(file))?;
        reader.size_bytes = size;
        Ok(reader)
    }
}

impl<R: Read + Seek> ArchiveReader<R> {
    pub fn new(reader: R) -> JournalResult<Self> {
        let archive = ZipArchive::new(reader)
            .map_err(|e| JournalError::Format(format!("not a zip archive: {}", e)))?;
        Ok(Self {
            archive,
            size_bytes: 0,
        })
    }

    /// Parse `data.json`, returning the document and a digest of its bytes
    pub fn read_document(&mut self) -> JournalResult<(ArchiveDocument, String)> {
        let bytes = {
            let mut entry = self
                .archive
                .by_name(DATA_FILE)
                .map_err(|_| JournalError::Format(format!("{} is missing", DATA_FILE)))?;
            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes)?;
            bytes
        };

        let document: ArchiveDocument = serde_json::from_slice(&bytes)
            .map_err(|e| JournalError::Format(format!("{} is not valid: {}", DATA_FILE, e)))?;

        debug!(
            accounts = document.accounts.len(),
            trades = document.trades.len(),
            "Parsed archive document"
        );
        Ok((document, document_digest(&bytes)))
    }

    /// Names of the image entries, without the `images/` prefix
    pub fn image_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .archive
            .file_names()
            .filter_map(image_file_name)
            .map(str::to_string)
            .collect();
        names.sort();
        names
    }

    /// Decode every image entry
    ///
    /// Returns `None` when cancelled between entries.
    pub fn read_images(
        &mut self,
        cancel: &CancelToken,
        progress: &mut dyn ProgressReporter,
    ) -> JournalResult<Option<HashMap<String, InlineImage>>> {
        let names = self.image_names();
        let total = names.len();
        let throughput = Throughput::start();
        let mut images = HashMap::with_capacity(total);

        for (done, name) in names.into_iter().enumerate() {
            if cancel.is_cancelled() {
                return Ok(None);
            }

            let mut entry = self
                .archive
                .by_name(&format!("{}{}", IMAGES_DIR, name))
                .map_err(|e| JournalError::Format(format!("unreadable image {}: {}", name, e)))?;
            let mut bytes = Vec::with_capacity(prealloc_len(entry.size()));
            entry.read_to_end(&mut bytes)?;
            drop(entry);

            let image = InlineImage::from_file_bytes(&name, bytes);
            images.insert(name, image);
            progress.report(&throughput.progress(Stage::ReadingImages, done + 1, total));
        }

        Ok(Some(images))
    }

    /// Summarize the archive for inspection
    pub fn summary(&mut self) -> JournalResult<ArchiveSummary> {
        let (document, _) = self.read_document()?;
        Ok(ArchiveSummary {
            size_bytes: self.size_bytes,
            accounts: document.accounts.len(),
            trades: document.trades.len(),
            open_trades: document.trades.iter().filter(|t| t.is_open()).count(),
            images: self.image_names().len(),
            export_date: document.export_date,
            version: document.version,
        })
    }
}

/// Buffer size to reserve for an entry; zip headers can lie
fn prealloc_len(declared: u64) -> usize {
    declared.min(MAX_IMAGE_PREALLOC) as usize
}

fn image_file_name(entry: &str) -> Option<&str> {
    entry
        .strip_prefix(IMAGES_DIR)
        .filter(|name| !name.is_empty() && !name.ends_with('/'))
}

/// Outcome of reattaching images to trades
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub restored: usize,
    /// Filenames referenced by trades but absent from the archive
    pub missing: Vec<String>,
}

/// Replace archived image filenames with inline data
///
/// Trades without a uid get their legacy uid first. Images are found by the
/// name derived from the uid, never by the name the trade recorded, so a
/// trade cannot pick up another trade's screenshot. A reference whose image
/// cannot be found is cleared.
pub fn reconcile(trades: &mut [Trade], images: &HashMap<String, InlineImage>) -> ReconcileReport {
    let mut by_stem: HashMap<&str, &str> = HashMap::new();
    for name in images.keys() {
        if let Some(stem) = Path::new(name).file_stem().and_then(|s| s.to_str()) {
            by_stem
                .entry(stem)
                .and_modify(|current| {
                    if name.as_str() < *current {
                        *current = name.as_str();
                    }
                })
                .or_insert(name.as_str());
        }
    }

    let mut report = ReconcileReport::default();
    for trade in trades.iter_mut() {
        if trade.uid.is_blank() {
            trade.uid = TradeUid::legacy(trade.id);
        }

        for slot in [ImageSlot::Entry, ImageSlot::Exit] {
            let Some(reference) = trade.image(slot) else {
                continue;
            };
            if reference.starts_with("data:") {
                report.restored += 1;
                continue;
            }

            let stem = format!("{}_{}", slot.prefix(), trade.uid);
            let candidates = [
                Some(format!("{}.png", stem)),
                by_stem.get(stem.as_str()).map(|s| s.to_string()),
            ];
            let found = candidates
                .into_iter()
                .flatten()
                .find_map(|name| images.get(&name).map(|image| (name, image)));

            match found {
                Some((name, image)) => {
                    trade.set_image(slot, Some(image.to_data_uri()), Some(name));
                    report.restored += 1;
                }
                None => {
                    let expected = format!("{}.png", stem);
                    warn!(
                        trade = %trade.uid,
                        slot = %slot,
                        file = %expected,
                        "Screenshot missing from archive, clearing reference"
                    );
                    trade.set_image(slot, None, None);
                    report.missing.push(expected);
                }
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::progress::NoProgress;
    use crate::backup::writer::ArchiveWriter;
    use crate::models::Account;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn trade(id: i64, uid: &str, entry: Option<&str>) -> Trade {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "uid": uid,
            "accountId": 1,
            "symbol": "SOL",
            "date": "2024-03-01T08:15",
            "type": "sell",
            "entryPrice": 100.0,
            "stopLoss": 110.0,
            "takeProfit": 80.0,
            "riskPercent": 2.0,
            "entryScreenshot": entry
        }))
        .unwrap()
    }

    fn zip_with(entries: &[(&str, &[u8])]) -> Cursor<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, bytes) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(bytes).unwrap();
        }
        let mut cursor = zip.finish().unwrap();
        cursor.set_position(0);
        cursor
    }

    #[test]
    fn test_size_limit() {
        assert!(check_archive_size(MAX_ARCHIVE_BYTES).is_ok());
        assert!(matches!(
            check_archive_size(MAX_ARCHIVE_BYTES + 1),
            Err(JournalError::ArchiveTooLarge { .. })
        ));
    }

    #[test]
    fn test_missing_data_file_is_format_error() {
        let cursor = zip_with(&[("images/entry_trade_1.png", b"png")]);
        let mut reader = ArchiveReader::new(cursor).unwrap();
        assert!(matches!(
            reader.read_document(),
            Err(JournalError::Format(_))
        ));
    }

    #[test]
    fn test_bad_json_is_format_error() {
        let cursor = zip_with(&[(DATA_FILE, b"{ not json")]);
        let mut reader = ArchiveReader::new(cursor).unwrap();
        assert!(matches!(
            reader.read_document(),
            Err(JournalError::Format(_))
        ));
    }

    #[test]
    fn test_not_a_zip() {
        assert!(matches!(
            ArchiveReader::new(Cursor::new(b"plain text".to_vec())),
            Err(JournalError::Format(_))
        ));
    }

    #[test]
    fn test_read_written_archive() {
        let image = InlineImage::new("image/png", vec![5, 6, 7]);
        let trades = vec![trade(1, "trade_1", Some(&image.to_data_uri()))];
        let (mut cursor, _) = ArchiveWriter::default()
            .write_to(
                Cursor::new(Vec::new()),
                &[Account::primary()],
                &trades,
                &CancelToken::new(),
                &mut NoProgress,
            )
            .unwrap()
            .unwrap();
        cursor.set_position(0);

        let mut reader = ArchiveReader::new(cursor).unwrap();
        let (mut document, digest) = reader.read_document().unwrap();
        assert_eq!(digest.len(), 64);
        assert_eq!(reader.image_names(), vec!["entry_trade_1.png".to_string()]);

        let images = reader
            .read_images(&CancelToken::new(), &mut NoProgress)
            .unwrap()
            .unwrap();
        let report = reconcile(&mut document.trades, &images);
        assert_eq!(report.restored, 1);
        assert_eq!(
            document.trades[0].image(ImageSlot::Entry),
            Some(image.to_data_uri().as_str())
        );
    }

    #[test]
    fn test_read_images_cancelled() {
        let cursor = zip_with(&[(DATA_FILE, b"{}"), ("images/a.png", b"1")]);
        let mut reader = ArchiveReader::new(cursor).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(reader.read_images(&cancel, &mut NoProgress).unwrap().is_none());
    }

    #[test]
    fn test_reconcile_legacy_uid() {
        let mut trades = vec![trade(42, "", Some("entry_trade_42.png"))];
        let mut images = HashMap::new();
        images.insert(
            "entry_trade_42.png".to_string(),
            InlineImage::new("image/png", vec![1]),
        );

        let report = reconcile(&mut trades, &images);
        assert_eq!(trades[0].uid.as_str(), "trade_42");
        assert_eq!(report.restored, 1);
        assert!(trades[0].image(ImageSlot::Entry).unwrap().starts_with("data:image/png"));
    }

    #[test]
    fn test_reconcile_ignores_recorded_name_of_another_trade() {
        let mut trades = vec![trade(2, "trade_2", Some("entry_trade_1.png"))];
        let mut images = HashMap::new();
        images.insert(
            "entry_trade_1.png".to_string(),
            InlineImage::new("image/png", vec![1]),
        );

        let report = reconcile(&mut trades, &images);
        assert_eq!(report.restored, 0);
        assert_eq!(report.missing, vec!["entry_trade_2.png".to_string()]);
        assert!(trades[0].image(ImageSlot::Entry).is_none());
        assert!(trades[0].image_name(ImageSlot::Entry).is_none());
    }

    #[test]
    fn test_prealloc_is_capped() {
        assert_eq!(prealloc_len(1024), 1024);
        assert_eq!(prealloc_len(u64::MAX), MAX_IMAGE_PREALLOC as usize);
    }

    #[test]
    fn test_reconcile_matches_other_extension() {
        let mut trades = vec![trade(7, "trade_7_x", Some("whatever"))];
        let mut images = HashMap::new();
        images.insert(
            "entry_trade_7_x.jpg".to_string(),
            InlineImage::from_file_bytes("entry_trade_7_x.jpg", vec![1]),
        );

        reconcile(&mut trades, &images);
        assert_eq!(
            trades[0].image_name(ImageSlot::Entry),
            Some("entry_trade_7_x.jpg")
        );
        assert!(trades[0].image(ImageSlot::Entry).unwrap().starts_with("data:image/jpeg"));
    }

    #[test]
    fn test_reconcile_clears_missing() {
        let mut trades = vec![trade(3, "trade_3", Some("entry_trade_3.png"))];
        let report = reconcile(&mut trades, &HashMap::new());
        assert_eq!(report.missing, vec!["entry_trade_3.png".to_string()]);
        assert!(trades[0].image(ImageSlot::Entry).is_none());
        assert!(trades[0].image_name(ImageSlot::Entry).is_none());
    }
}
