//! CSV Export functionality
//!
//! Exports trades and accounts to CSV format.

use std::collections::HashMap;
use std::io::Write;

use crate::error::JournalResult;
use crate::models::{AccountId, Trade};
use crate::storage::Storage;

const TRADE_HEADER: [&str; 19] = [
    "ID",
    "UID",
    "Date",
    "Account",
    "Symbol",
    "Direction",
    "Entry",
    "Stop Loss",
    "Take Profit",
    "Risk %",
    "Risk Amount",
    "Position Size",
    "Position Value",
    "Total Fee",
    "R:R",
    "Status",
    "Close Price",
    "Close Date",
    "P&L",
];

/// Export trades to CSV, optionally limited to one account
///
/// Returns the number of trades written.
pub fn export_trades_csv<W: Write>(
    storage: &Storage,
    account: Option<AccountId>,
    writer: W,
) -> JournalResult<usize> {
    let account_names: HashMap<_, _> = storage
        .accounts
        .get_all()?
        .into_iter()
        .map(|a| (a.id, a.name))
        .collect();

    let trades = match account {
        Some(id) => storage.trades.get_by_account(id)?,
        None => storage.trades.get_all()?,
    };

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(TRADE_HEADER)?;

    for trade in &trades {
        let account_name = account_names
            .get(&trade.account_id)
            .map(String::as_str)
            .unwrap_or("Unknown");
        csv.write_record(trade_row(trade, account_name))?;
    }

    csv.flush()?;
    Ok(trades.len())
}

fn trade_row(trade: &Trade, account_name: &str) -> Vec<String> {
    let (close_price, close_date, pnl) = if trade.is_closed() {
        (
            trade.closed_price.map(|p| p.to_string()).unwrap_or_default(),
            trade
                .closed_date
                .map(|d| d.to_rfc3339())
                .unwrap_or_default(),
            format!("{:.2}", trade.pnl()),
        )
    } else {
        (String::new(), String::new(), String::new())
    };

    vec![
        trade.id.to_string(),
        trade.effective_uid().to_string(),
        trade.date.format("%Y-%m-%d %H:%M").to_string(),
        account_name.to_string(),
        trade.symbol.clone(),
        trade.direction.to_string(),
        trade.entry_display(),
        trade.stop_display(),
        trade.target_display(),
        trade.risk_percent.to_string(),
        format!("{:.2}", trade.total_risk_amount),
        format!("{:.6}", trade.position_size),
        format!("{:.2}", trade.position_value),
        format!("{:.2}", trade.total_fee),
        format!("{:.2}", trade.risk_reward_ratio),
        trade.status.to_string(),
        close_price,
        close_date,
        pnl,
    ]
}

/// Export accounts to CSV
pub fn export_accounts_csv<W: Write>(storage: &Storage, writer: W) -> JournalResult<usize> {
    let accounts = storage.accounts.get_all()?;

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["ID", "Name", "Balance", "Primary", "Trades"])?;
    for account in &accounts {
        let trades = storage.trades.get_by_account(account.id)?.len();
        csv.write_record([
            account.id.to_string(),
            account.name.clone(),
            format!("{:.2}", account.balance),
            account.is_primary().to_string(),
            trades.to_string(),
        ])?;
    }

    csv.flush()?;
    Ok(accounts.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::JournalPaths;
    use crate::models::{Account, Direction};
    use crate::services::{AccountService, TradeInput, TradeService};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = JournalPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        AccountService::new(&storage)
            .set_balance(AccountId::PRIMARY, 1000.0)
            .unwrap();
        (temp_dir, storage)
    }

    fn input(symbol: &str) -> TradeInput {
        TradeInput {
            symbol: symbol.into(),
            date: NaiveDate::from_ymd_opt(2024, 2, 3)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            direction: Direction::Long,
            entry: "100".into(),
            stop: "95".into(),
            target: "110".into(),
            risk_percent: 1.0,
            fee_percent: 0.0,
        }
    }

    #[test]
    fn test_export_trades_csv() {
        let (_temp_dir, storage) = create_test_storage();
        let service = TradeService::new(&storage);
        let trade = service
            .open(AccountId::PRIMARY, input("BTC, perp"), None)
            .unwrap();
        service.close(trade.id, 105.0, None).unwrap();

        let mut buffer = Vec::new();
        let count = export_trades_csv(&storage, None, &mut buffer).unwrap();
        let output = String::from_utf8(buffer).unwrap();

        assert_eq!(count, 1);
        let mut lines = output.lines();
        assert!(lines.next().unwrap().starts_with("ID,UID,Date"));
        let row = lines.next().unwrap();
        assert!(row.contains("\"BTC, PERP\""));
        assert!(row.contains("Main Account"));
        assert!(row.contains("Closed"));
        assert!(row.ends_with("10.00"));
    }

    #[test]
    fn test_export_filters_by_account() {
        let (_temp_dir, storage) = create_test_storage();
        storage
            .accounts
            .upsert(Account::new(AccountId::new(2), "Spot", 500.0))
            .unwrap();
        TradeService::new(&storage)
            .open(AccountId::PRIMARY, input("ETH"), None)
            .unwrap();

        let mut buffer = Vec::new();
        let count = export_trades_csv(&storage, Some(AccountId::new(2)), &mut buffer).unwrap();
        assert_eq!(count, 0);
        assert_eq!(String::from_utf8(buffer).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_export_accounts_csv() {
        let (_temp_dir, storage) = create_test_storage();

        let mut buffer = Vec::new();
        let count = export_accounts_csv(&storage, &mut buffer).unwrap();
        let output = String::from_utf8(buffer).unwrap();

        assert_eq!(count, 1);
        assert!(output.contains("1,Main Account,1000.00,true,0"));
    }
}
