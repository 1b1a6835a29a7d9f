//! Display formatting for terminal output
//!
//! Table and detail views for accounts and trades. Reports format
//! themselves.

pub mod account;
pub mod trade;

pub use account::{format_account_details, format_account_list};
pub use trade::{format_trade_details, format_trade_list};
