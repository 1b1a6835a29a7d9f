//! Custom error types for the trade journal
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions. Restore-specific conditions are split by
//! severity: `Format` and `QuotaExceeded` abort a restore, `RecordWrite` is
//! recovered from per record.

use thiserror::Error;

/// The main error type for trade journal operations
#[derive(Error, Debug)]
pub enum JournalError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// The primary account can never be removed
    #[error("The primary account cannot be deleted")]
    PrimaryAccount,

    /// Archive is missing a required entry or carries unparsable JSON
    #[error("Invalid archive: {0}")]
    Format(String),

    /// Archive exceeds the accepted restore size
    #[error("Archive is too large ({size} bytes, maximum is {max} bytes)")]
    ArchiveTooLarge { size: u64, max: u64 },

    /// Persistent storage is full
    #[error("Storage quota exceeded: {0}. Export a backup and delete old trades to free space")]
    QuotaExceeded(String),

    /// A single record could not be written
    #[error("Failed to write {record}: {reason}")]
    RecordWrite { record: String, reason: String },

    /// A destructive operation was attempted without confirmation
    #[error("Confirmation required: {0}")]
    ConfirmationRequired(String),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl JournalError {
    /// Create a "not found" error for accounts
    pub fn account_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Account",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for trades
    pub fn trade_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Trade",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if persistent storage ran out of space
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded(_))
    }

    /// Whether this error must abort a restore rather than skip one record
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::RecordWrite { .. })
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for JournalError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::StorageFull => Self::QuotaExceeded(err.to_string()),
            _ => Self::Io(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for JournalError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<zip::result::ZipError> for JournalError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(io) => io.into(),
            other => Self::Format(other.to_string()),
        }
    }
}

impl From<csv::Error> for JournalError {
    fn from(err: csv::Error) -> Self {
        Self::Export(err.to_string())
    }
}

/// Result type alias for trade journal operations
pub type JournalResult<T> = Result<T, JournalError>;
