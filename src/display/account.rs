//! Account display formatting
//!
//! Formats accounts for terminal output in table and detail views.

use crate::models::AccountId;
use crate::services::AccountSummary;

fn money(value: f64, currency: &str) -> String {
    if value < 0.0 {
        format!("-{}{:.2}", currency, value.abs())
    } else {
        format!("{}{:.2}", currency, value)
    }
}

/// Format a list of accounts as a table, marking the active one
pub fn format_account_list(
    summaries: &[AccountSummary],
    active: AccountId,
    currency: &str,
) -> String {
    if summaries.is_empty() {
        return "No accounts found.".to_string();
    }

    let name_width = summaries
        .iter()
        .map(|s| s.account.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "  {:>4}  {:<name_width$}  {:>14}  {:>6}  {:>6}  {:>12}\n",
        "ID",
        "Name",
        "Balance",
        "Trades",
        "Open",
        "Realized",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "  {:->4}  {:-<name_width$}  {:->14}  {:->6}  {:->6}  {:->12}\n",
        "",
        "",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for summary in summaries {
        let marker = if summary.account.id == active { "*" } else { " " };
        output.push_str(&format!(
            "{} {:>4}  {:<name_width$}  {:>14}  {:>6}  {:>6}  {:>12}\n",
            marker,
            summary.account.id,
            summary.account.name,
            money(summary.account.balance, currency),
            summary.trade_count,
            summary.open_trades,
            money(summary.realized_pnl, currency),
            name_width = name_width,
        ));
    }

    output
}

/// Format a single account's details
pub fn format_account_details(summary: &AccountSummary, currency: &str) -> String {
    let account = &summary.account;

    let mut output = String::new();
    output.push_str(&format!("Account: {}\n", account.name));
    output.push_str(&format!("  ID:             {}\n", account.id));
    output.push_str(&format!(
        "  Primary:        {}\n",
        if account.is_primary() { "Yes" } else { "No" }
    ));
    output.push_str(&format!(
        "  Balance:        {}\n",
        money(account.balance, currency)
    ));
    output.push_str(&format!("  Trades:         {}\n", summary.trade_count));
    output.push_str(&format!("  Open Trades:    {}\n", summary.open_trades));
    output.push_str(&format!(
        "  Realized P&L:   {}\n",
        money(summary.realized_pnl, currency)
    ));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Account;

    fn create_test_summary(id: u32, name: &str, balance: f64) -> AccountSummary {
        AccountSummary {
            account: Account::new(AccountId::new(id), name, balance),
            trade_count: 3,
            open_trades: 1,
            realized_pnl: -12.5,
        }
    }

    #[test]
    fn test_format_account_list() {
        let summaries = vec![
            create_test_summary(1, "Main Account", 1000.0),
            create_test_summary(2, "Futures", 250.0),
        ];

        let output = format_account_list(&summaries, AccountId::new(2), "$");
        assert!(output.contains("Main Account"));
        assert!(output.contains("$1000.00"));
        assert!(output.contains("-$12.50"));
        assert!(output.lines().any(|l| l.starts_with('*') && l.contains("Futures")));
    }

    #[test]
    fn test_format_empty_list() {
        let output = format_account_list(&[], AccountId::PRIMARY, "$");
        assert!(output.contains("No accounts found"));
    }

    #[test]
    fn test_format_account_details() {
        let output = format_account_details(&create_test_summary(1, "Main Account", 10.0), "€");
        assert!(output.contains("Primary:        Yes"));
        assert!(output.contains("€10.00"));
    }
}
