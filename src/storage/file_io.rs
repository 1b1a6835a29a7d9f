//! File I/O utilities with atomic writes
//!
//! Writes go to a sibling temp file which is synced and renamed over the
//! target, so a crash leaves either the old or the new content.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::JournalError;

fn storage_error(context: String, err: io::Error) -> JournalError {
    if err.kind() == io::ErrorKind::StorageFull {
        JournalError::QuotaExceeded(format!("{}: {}", context, err))
    } else {
        JournalError::Storage(format!("{}: {}", context, err))
    }
}

/// Read JSON from a file, returning a default value if file doesn't exist
pub fn read_json<T, P>(path: P) -> Result<T, JournalError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        return Ok(T::default());
    }

    read_json_required(path)
}

/// Read JSON from a file, returning an error if file doesn't exist
pub fn read_json_required<T, P>(path: P) -> Result<T, JournalError>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    let file = File::open(path)
        .map_err(|e| storage_error(format!("Failed to open {}", path.display()), e))?;

    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| JournalError::Storage(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Serialize a value the way it will be stored on disk
pub fn to_stored_bytes<T: Serialize>(data: &T) -> Result<Vec<u8>, JournalError> {
    serde_json::to_vec_pretty(data)
        .map_err(|e| JournalError::Storage(format!("Failed to serialize data: {}", e)))
}

/// Write JSON to a file atomically (write to temp, then rename)
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), JournalError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let bytes = to_stored_bytes(data)?;
    write_bytes_atomic(path, &bytes)
}

/// Write raw bytes atomically
pub fn write_bytes_atomic<P: AsRef<Path>>(path: P, bytes: &[u8]) -> Result<(), JournalError> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            storage_error(format!("Failed to create directory {}", parent.display()), e)
        })?;
    }

    let temp_path = temp_path_for(path);

    let result = (|| {
        let file = File::create(&temp_path)
            .map_err(|e| storage_error("Failed to create temp file".into(), e))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(bytes)
            .map_err(|e| storage_error("Failed to write data".into(), e))?;
        writer
            .flush()
            .map_err(|e| storage_error("Failed to flush data".into(), e))?;
        writer
            .get_ref()
            .sync_all()
            .map_err(|e| storage_error("Failed to sync data".into(), e))?;
        fs::rename(&temp_path, path)
            .map_err(|e| storage_error("Failed to rename temp file".into(), e))
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

/// Temp file used while atomically replacing `path`
pub fn temp_path_for(path: &Path) -> std::path::PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Check if a JSON file exists and is valid
pub fn json_file_valid<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref();
    match File::open(path) {
        Ok(file) => serde_json::from_reader::<_, serde_json::Value>(BufReader::new(file)).is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    struct Snapshot {
        symbol: String,
        count: u32,
    }

    fn sample() -> Snapshot {
        Snapshot {
            symbol: "BTCUSDT".to_string(),
            count: 3,
        }
    }

    #[test]
    fn test_read_missing_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let data: Snapshot = read_json(temp_dir.path().join("missing.json")).unwrap();
        assert_eq!(data, Snapshot::default());
    }

    #[test]
    fn test_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("trades.json");

        write_json_atomic(&path, &sample()).unwrap();
        let loaded: Snapshot = read_json(&path).unwrap();
        assert_eq!(loaded, sample());
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn test_required_read_fails_when_missing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.json");
        assert!(read_json_required::<Snapshot, _>(&path).is_err());
    }

    #[test]
    fn test_json_file_valid() {
        let temp_dir = TempDir::new().unwrap();
        let valid = temp_dir.path().join("valid.json");
        let invalid = temp_dir.path().join("invalid.json");

        fs::write(&valid, r#"{"symbol": "ETH"}"#).unwrap();
        fs::write(&invalid, "{ truncated").unwrap();

        assert!(json_file_valid(&valid));
        assert!(!json_file_valid(&invalid));
        assert!(!json_file_valid(temp_dir.path().join("missing.json")));
    }

    #[test]
    fn test_temp_path_keeps_extension() {
        let path = Path::new("/tmp/journal/data.zip");
        assert_eq!(temp_path_for(path), Path::new("/tmp/journal/data.zip.tmp"));
    }
}
