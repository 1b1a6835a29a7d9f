//! Journal archive layout
//!
//! ```text
//! data.json                 {accounts, trades, exportDate, version}
//! images/entry_<uid>.png    raw screenshot bytes
//! images/exit_<uid>.png
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::models::{Account, Trade};

/// Name of the JSON document inside an archive
pub const DATA_FILE: &str = "data.json";

/// Folder holding screenshot files
pub const IMAGES_DIR: &str = "images/";

/// Version written into new archives
pub const ARCHIVE_VERSION: &str = "4.0";

/// Largest archive accepted for restore (2 GiB)
pub const MAX_ARCHIVE_BYTES: u64 = 2 * 1024 * 1024 * 1024;

/// The JSON document of an archive
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveDocument {
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub trades: Vec<Trade>,
    #[serde(default)]
    pub export_date: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// File name of an export made on `date`
pub fn archive_file_name(date: NaiveDate) -> String {
    format!("crypto-journal-{}.zip", date.format("%Y-%m-%d"))
}

/// Path of an image file inside the archive
pub fn image_entry_path(file_name: &str) -> String {
    format!("{}{}", IMAGES_DIR, file_name)
}

/// Hex SHA-256 of an archive's data.json bytes
pub fn document_digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
