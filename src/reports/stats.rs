//! Journal statistics
//!
//! Realized P&L figures over closed trades and the risk currently held in
//! open trades.

use crate::models::sizing::risk_amount;
use crate::models::Trade;

/// Aggregate statistics for a set of trades
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JournalStats {
    pub total_trades: usize,
    pub open_trades: usize,
    pub closed_trades: usize,
    pub winning_trades: usize,
    /// Sum of positive P&L
    pub total_profit: f64,
    /// Sum of negative P&L, as a positive number
    pub total_loss: f64,
    /// Fees across every trade, open or closed
    pub total_fees: f64,
    /// Percentage of closed trades with positive P&L
    pub win_rate: f64,
    pub max_profit: f64,
    /// Largest single loss, as a positive number
    pub max_loss: f64,
    pub total_pnl: f64,
}

impl JournalStats {
    /// Compute statistics over `trades`
    pub fn generate(trades: &[Trade]) -> Self {
        let mut stats = Self {
            total_trades: trades.len(),
            ..Self::default()
        };

        for trade in trades {
            stats.total_fees += trade.total_fee;

            if trade.is_open() {
                stats.open_trades += 1;
                continue;
            }

            stats.closed_trades += 1;
            let pnl = trade.pnl();
            stats.total_pnl += pnl;

            if pnl > 0.0 {
                stats.winning_trades += 1;
                stats.total_profit += pnl;
                stats.max_profit = stats.max_profit.max(pnl);
            } else if pnl < 0.0 {
                stats.total_loss += -pnl;
                stats.max_loss = stats.max_loss.max(-pnl);
            }
        }

        if stats.closed_trades > 0 {
            stats.win_rate = stats.winning_trades as f64 / stats.closed_trades as f64 * 100.0;
        }

        stats
    }

    /// Format for terminal output
    pub fn format_terminal(&self, currency: &str) -> String {
        let money = |v: f64| format!("{}{:.2}", currency, v);
        let mut output = String::new();

        output.push_str("Journal Statistics\n");
        output.push_str(&"=".repeat(40));
        output.push('\n');
        output.push_str(&format!("{:<20} {:>19}\n", "Total trades:", self.total_trades));
        output.push_str(&format!("{:<20} {:>19}\n", "Open trades:", self.open_trades));
        output.push_str(&format!("{:<20} {:>19}\n", "Closed trades:", self.closed_trades));
        output.push_str(&format!("{:<20} {:>18.1}%\n", "Win rate:", self.win_rate));
        output.push_str(&format!("{:<20} {:>19}\n", "Total profit:", money(self.total_profit)));
        output.push_str(&format!("{:<20} {:>19}\n", "Total loss:", money(self.total_loss)));
        output.push_str(&format!("{:<20} {:>19}\n", "Total fees:", money(self.total_fees)));
        output.push_str(&format!("{:<20} {:>19}\n", "Net P&L:", money(self.total_pnl)));
        output.push_str(&format!("{:<20} {:>19}\n", "Best trade:", format!("+{}", money(self.max_profit))));
        output.push_str(&format!("{:<20} {:>19}\n", "Worst trade:", format!("-{}", money(self.max_loss))));

        output
    }
}

/// Risk currently held in open trades
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OpenRisk {
    pub amount: f64,
    /// Percentage of the balance; zero when the balance is not positive
    pub percent: f64,
    pub open_trades: usize,
}

/// Total risk of the open trades, recomputed against the current balance
pub fn open_risk(trades: &[Trade], balance: f64) -> OpenRisk {
    let mut risk = OpenRisk::default();

    for trade in trades.iter().filter(|t| t.is_open()) {
        risk.amount += risk_amount(balance, trade.risk_percent);
        risk.open_trades += 1;
    }

    if balance > 0.0 {
        risk.percent = risk.amount / balance * 100.0;
    }
    risk
}
