//! Reports for the trade journal
//!
//! Aggregate statistics over an account's trades and month-by-month
//! summaries.

pub mod monthly;
pub mod stats;

pub use monthly::{MonthlySummary, YearMonth};
pub use stats::{open_risk, JournalStats, OpenRisk};
