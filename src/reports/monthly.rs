//! Monthly summary
//!
//! Trades entered within one calendar month with their realized results.

use chrono::{Datelike, Local, NaiveDateTime};
use std::fmt;
use std::str::FromStr;

use crate::models::Trade;

/// A calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// Create a month, rejecting values outside 1..=12
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// The month containing `date`
    pub fn of(date: &NaiveDateTime) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The current local month
    pub fn current() -> Self {
        Self::of(&Local::now().naive_local())
    }

    /// Month of the most recent trade, or the current month when there are none
    pub fn latest(trades: &[Trade]) -> Self {
        trades
            .iter()
            .map(|t| t.date)
            .max()
            .map(|d| Self::of(&d))
            .unwrap_or_else(Self::current)
    }

    pub fn contains(&self, date: &NaiveDateTime) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("Invalid month '{}', expected YYYY-MM", s);
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }
}

/// Summary of one month of trading
#[derive(Debug, Clone)]
pub struct MonthlySummary {
    pub month: YearMonth,
    /// Trades entered this month, newest first
    pub trades: Vec<Trade>,
    pub total_pnl: f64,
    pub profitable: usize,
    pub losing: usize,
}

impl MonthlySummary {
    /// Summarize the trades entered during `month`
    pub fn generate(trades: &[Trade], month: YearMonth) -> Self {
        let mut monthly: Vec<Trade> = trades
            .iter()
            .filter(|t| month.contains(&t.date))
            .cloned()
            .collect();
        monthly.sort_by(|a, b| b.date.cmp(&a.date));

        let mut summary = Self {
            month,
            trades: Vec::new(),
            total_pnl: 0.0,
            profitable: 0,
            losing: 0,
        };

        for trade in monthly.iter().filter(|t| t.is_closed()) {
            let pnl = trade.pnl();
            summary.total_pnl += pnl;
            if pnl > 0.0 {
                summary.profitable += 1;
            } else if pnl < 0.0 {
                summary.losing += 1;
            }
        }

        summary.trades = monthly;
        summary
    }

    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }

    /// Format for terminal output
    pub fn format_terminal(&self, currency: &str) -> String {
        let mut output = String::new();

        output.push_str(&format!("Monthly Summary: {}\n", self.month));
        output.push_str(&"=".repeat(72));
        output.push('\n');
        output.push_str(&format!(
            "Trades: {}   Profitable: {}   Losing: {}   P&L: {}\n\n",
            self.trade_count(),
            self.profitable,
            self.losing,
            signed_money(self.total_pnl, currency)
        ));

        if self.trades.is_empty() {
            output.push_str("No trades this month.\n");
            return output;
        }

        output.push_str(&format!(
            "{:<16} {:<10} {:<6} {:>12} {:>12} {:>12}\n",
            "Date", "Symbol", "Side", "Entry", "Close", "P&L"
        ));
        output.push_str(&"-".repeat(72));
        output.push('\n');

        for trade in &self.trades {
            let (close, pnl) = match trade.closed_price {
                Some(price) if trade.is_closed() => {
                    (price.to_string(), signed_money(trade.pnl(), currency))
                }
                _ => ("-".to_string(), "open".to_string()),
            };
            output.push_str(&format!(
                "{:<16} {:<10} {:<6} {:>12} {:>12} {:>12}\n",
                trade.date.format("%Y-%m-%d %H:%M"),
                trade.symbol,
                trade.direction,
                trade.entry_display(),
                close,
                pnl
            ));
        }

        output
    }
}

fn signed_money(value: f64, currency: &str) -> String {
    let sign = if value >= 0.0 { "+" } else { "-" };
    format!("{}{}{:.2}", sign, currency, value.abs())
}
