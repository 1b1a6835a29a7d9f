//! Audit trail for journal mutations
//!
//! Every account and trade change, and every archive restore, is appended
//! to `audit.log` as one JSON object per line (JSONL).
//!
//! - `AuditEntry`: one operation with optional before/after snapshots.
//! - `AuditLogger`: appends entries and reads them back.
//! - `generate_diff`: one-line summary of the fields an update changed.

mod diff;
mod entry;
mod logger;

pub use diff::generate_diff;
pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
