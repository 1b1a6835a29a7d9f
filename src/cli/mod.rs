//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod account;
pub mod audit;
pub mod backup;
pub mod export;
pub mod stats;
pub mod trade;

pub use account::{handle_account_command, AccountCommands};
pub use audit::handle_audit_command;
pub use backup::{handle_backup_command, BackupCommands};
pub use export::{handle_export_command, ExportCommands};
pub use stats::{handle_stats_command, StatsCommands};
pub use trade::{handle_trade_command, TradeCommands};
