//! Core data models for the trade journal
//!
//! This module contains the data structures of the journaling domain:
//! accounts, trades, their sizing figures and attached screenshots.

pub mod account;
pub mod ids;
pub mod image;
pub mod sizing;
pub mod trade;

pub use account::{Account, AccountValidationError, PRIMARY_ACCOUNT_NAME};
pub use ids::{AccountId, TradeId, TradeUid};
pub use image::{ImageSlot, InlineImage};
pub use sizing::{PositionSizing, SizingError, SizingInput};
pub use trade::{Direction, NewTrade, PriceInput, Trade, TradeStatus};
