//! Trade display formatting
//!
//! Journal list rows and the detailed view of a single trade.

use crate::models::{ImageSlot, Trade};

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}

fn signed(value: f64, currency: &str) -> String {
    let sign = if value >= 0.0 { "+" } else { "-" };
    format!("{}{}{:.2}", sign, currency, value.abs())
}

/// Format a single trade as a journal row
pub fn format_trade_row(trade: &Trade, currency: &str) -> String {
    let result = if trade.is_closed() {
        signed(trade.pnl(), currency)
    } else {
        "open".to_string()
    };

    format!(
        "{:>14} {:16} {:10} {:5} {:>12} {:>12} {:>12} {:>12}",
        trade.id,
        trade.date.format("%Y-%m-%d %H:%M"),
        truncate(&trade.symbol, 10),
        trade.direction,
        trade.entry_display(),
        trade.stop_display(),
        trade.target_display(),
        result
    )
}

/// Format a list of trades as a journal
pub fn format_trade_list(trades: &[Trade], currency: &str) -> String {
    if trades.is_empty() {
        return "No trades found.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:>14} {:16} {:10} {:5} {:>12} {:>12} {:>12} {:>12}\n",
        "ID", "Date", "Symbol", "Side", "Entry", "Stop", "Target", "P&L"
    ));
    output.push_str(&"-".repeat(100));
    output.push('\n');

    for trade in trades {
        output.push_str(&format_trade_row(trade, currency));
        output.push('\n');
    }

    output
}

/// Format trade details for display
pub fn format_trade_details(trade: &Trade, account_name: &str, currency: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("Trade: {} ({})\n", trade.id, trade.effective_uid()));
    output.push_str(&format!("Account:       {}\n", account_name));
    output.push_str(&format!("Symbol:        {}\n", trade.symbol));
    output.push_str(&format!(
        "Date:          {}\n",
        trade.date.format("%Y-%m-%d %H:%M")
    ));
    output.push_str(&format!("Direction:     {}\n", trade.direction));
    output.push_str(&format!("Status:        {}\n", trade.status));
    output.push('\n');
    output.push_str(&format!("Entry:         {}\n", trade.entry_display()));
    output.push_str(&format!("Stop Loss:     {}\n", trade.stop_display()));
    output.push_str(&format!("Take Profit:   {}\n", trade.target_display()));
    output.push_str(&format!("Risk:          {}%\n", trade.risk_percent));
    output.push_str(&format!(
        "Risk Amount:   {}{:.2}\n",
        currency, trade.total_risk_amount
    ));
    output.push_str(&format!("Position Size: {:.6}\n", trade.position_size));
    output.push_str(&format!(
        "Position Value: {}{:.2}\n",
        currency, trade.position_value
    ));
    output.push_str(&format!(
        "Fees:          {}{:.2} ({}%)\n",
        currency, trade.total_fee, trade.total_fee_percent
    ));
    output.push_str(&format!(
        "Target Profit: {}{:.2} net\n",
        currency, trade.net_profit
    ));
    output.push_str(&format!("R:R:           {:.2}\n", trade.risk_reward_ratio));

    if trade.is_closed() {
        output.push('\n');
        if let Some(price) = trade.closed_price {
            output.push_str(&format!("Closed At:     {}\n", price));
        }
        if let Some(date) = trade.closed_date {
            output.push_str(&format!(
                "Closed On:     {}\n",
                date.format("%Y-%m-%d %H:%M UTC")
            ));
        }
        output.push_str(&format!("P&L:           {}\n", signed(trade.pnl(), currency)));
    }

    let screenshots: Vec<String> = [ImageSlot::Entry, ImageSlot::Exit]
        .into_iter()
        .filter(|slot| trade.image(*slot).is_some())
        .map(|slot| {
            let name = trade.image_name(slot).unwrap_or("(unnamed)");
            format!("{} ({})", slot, name)
        })
        .collect();
    if !screenshots.is_empty() {
        output.push_str(&format!("\nScreenshots:   {}\n", screenshots.join(", ")));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_trade() -> Trade {
        serde_json::from_value(serde_json::json!({
            "id": 1714550000000i64,
            "uid": "trade_1714550000000_abc",
            "accountId": 1,
            "symbol": "ETHUSDT",
            "date": "2024-05-01T09:00",
            "type": "sell",
            "entryPrice": 3000.0,
            "entryPriceStr": "3000",
            "stopLoss": 3100.0,
            "takeProfit": 2800.0,
            "riskPercent": 1.0,
            "positionSize": 0.1,
            "entryScreenshot": "data:image/png;base64,AA==",
            "entryScreenshotName": "entry_trade_1714550000000_abc.png"
        }))
        .unwrap()
    }

    #[test]
    fn test_format_trade_list() {
        let output = format_trade_list(&[test_trade()], "$");
        assert!(output.contains("ETHUSDT"));
        assert!(output.contains("Short"));
        assert!(output.contains("open"));
    }

    #[test]
    fn test_format_empty_list() {
        assert!(format_trade_list(&[], "$").contains("No trades found"));
    }

    #[test]
    fn test_format_closed_details() {
        let mut trade = test_trade();
        trade.close(2900.0, Utc::now());

        let output = format_trade_details(&trade, "Main Account", "$");
        assert!(output.contains("Account:       Main Account"));
        assert!(output.contains("P&L:           +$10.00"));
        assert!(output.contains("entry (entry_trade_1714550000000_abc.png)"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("BTCUSDT", 10), "BTCUSDT");
        assert_eq!(truncate("VERYLONGSYMBOL", 5), "VERY…");
    }
}
