//! Service layer for the trade journal
//!
//! Business logic on top of the storage layer: validation, sizing and
//! cross-entity operations such as cascade deletes.

pub mod account;
pub mod trade;

pub use account::{AccountDeletion, AccountService, AccountSummary};
pub use trade::{TradeInput, TradeService};
