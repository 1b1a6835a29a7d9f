//! Trade journal - a local trading journal with archive backup and restore
//!
//! Records trades against one or more accounts, sizes positions from the
//! risk taken, keeps chart screenshots inline, and moves the whole journal
//! in and out of zip archives.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Accounts, trades, position sizing and inline images
//! - `storage`: JSON file storage layer
//! - `services`: Business logic layer
//! - `audit`: Audit logging system
//! - `backup`: Archive export and the resumable restore pipeline
//! - `reports`: Performance statistics
//! - `export`: CSV export
//! - `display`: Terminal formatting
//! - `cli`: Command handlers
//!
//! # Example
//!
//! ```rust,ignore
//! use trade_journal::config::{paths::JournalPaths, settings::Settings};
//! use trade_journal::storage::Storage;
//!
//! let paths = JournalPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let mut storage = Storage::open(paths, &settings)?;
//! storage.load_all()?;
//! ```

pub mod audit;
pub mod backup;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod models;
pub mod reports;
pub mod services;
pub mod storage;

pub use error::{JournalError, JournalResult};
