//! Export module for the trade journal
//!
//! Spreadsheet-friendly CSV exports. Full backups go through the archive
//! writer in `backup`.

pub mod csv;

pub use csv::{export_accounts_csv, export_trades_csv};
