//! Statistics CLI commands

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::error::{JournalError, JournalResult};
use crate::reports::{open_risk, JournalStats, MonthlySummary, YearMonth};
use crate::services::{AccountService, TradeService};
use crate::storage::Storage;

/// Statistics subcommands
#[derive(Subcommand)]
pub enum StatsCommands {
    /// Performance summary and open risk
    Summary {
        /// Account name or ID (defaults to the active account)
        #[arg(short, long)]
        account: Option<String>,
    },
    /// Results of a single month
    Monthly {
        /// Month as YYYY-MM (defaults to the latest month with trades)
        month: Option<String>,
        /// Account name or ID (defaults to the active account)
        #[arg(short, long)]
        account: Option<String>,
    },
}

/// Handle a stats command
pub fn handle_stats_command(
    storage: &Storage,
    settings: &Settings,
    cmd: StatsCommands,
) -> JournalResult<()> {
    let accounts = AccountService::new(storage);
    let trades = TradeService::new(storage);
    let currency = settings.currency_symbol.as_str();

    let resolve = |account: Option<String>| match account {
        Some(identifier) => accounts.require(&identifier),
        None => accounts.active(settings),
    };

    match cmd {
        StatsCommands::Summary { account } => {
            let account = resolve(account)?;
            let list = trades.list(account.id)?;

            println!("Account: {}", account.name);
            print!("{}", JournalStats::generate(&list).format_terminal(currency));

            let risk = open_risk(&list, account.balance);
            println!();
            println!(
                "Open risk: {}{:.2} ({:.2}% of balance) across {} open trade(s)",
                currency, risk.amount, risk.percent, risk.open_trades
            );
        }

        StatsCommands::Monthly { month, account } => {
            let account = resolve(account)?;
            let list = trades.list(account.id)?;
            let month = match month {
                Some(text) => text.parse::<YearMonth>().map_err(JournalError::Validation)?,
                None => YearMonth::latest(&list),
            };

            println!("Account: {}", account.name);
            print!(
                "{}",
                MonthlySummary::generate(&list, month).format_terminal(currency)
            );
        }
    }

    Ok(())
}
