//! Account CLI commands
//!
//! Implements CLI commands for account management.

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::account::{format_account_details, format_account_list};
use crate::error::{JournalError, JournalResult};
use crate::services::AccountService;
use crate::storage::Storage;

/// Account subcommands
#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a new account
    Create {
        /// Account name
        name: String,
        /// Starting balance, greater than zero
        #[arg(short, long)]
        balance: f64,
    },
    /// List all accounts
    List,
    /// Show account details
    Show {
        /// Account name or ID (defaults to the active account)
        account: Option<String>,
    },
    /// Set an account's balance
    Balance {
        /// Account name or ID
        account: String,
        /// New balance, greater than zero
        amount: f64,
    },
    /// Rename an account
    Rename {
        /// Account name or ID
        account: String,
        /// New name
        name: String,
    },
    /// Make an account the active one
    Switch {
        /// Account name or ID
        account: String,
    },
    /// Delete an account and all of its trades
    Delete {
        /// Account name or ID
        account: String,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

/// Handle an account command
pub fn handle_account_command(
    storage: &Storage,
    settings: &mut Settings,
    cmd: AccountCommands,
) -> JournalResult<()> {
    let service = AccountService::new(storage);
    let currency = settings.currency_symbol.clone();

    match cmd {
        AccountCommands::Create { name, balance } => {
            let account = service.create(&name, balance)?;
            println!("Created account: {}", account.name);
            println!("  Balance: {}{:.2}", currency, account.balance);
            println!("  ID: {}", account.id);
        }

        AccountCommands::List => {
            let summaries = service.summaries()?;
            print!(
                "{}",
                format_account_list(&summaries, settings.active_account_id, &currency)
            );
        }

        AccountCommands::Show { account } => {
            let found = match account {
                Some(identifier) => service.require(&identifier)?,
                None => service.active(settings)?,
            };
            let summary = service
                .summaries()?
                .into_iter()
                .find(|s| s.account.id == found.id)
                .ok_or_else(|| JournalError::account_not_found(found.id.to_string()))?;
            print!("{}", format_account_details(&summary, &currency));
        }

        AccountCommands::Balance { account, amount } => {
            let found = service.require(&account)?;
            let updated = service.set_balance(found.id, amount)?;
            println!(
                "Balance of {} set to {}{:.2}",
                updated.name, currency, updated.balance
            );
        }

        AccountCommands::Rename { account, name } => {
            let found = service.require(&account)?;
            let updated = service.rename(found.id, &name)?;
            println!("Renamed account {} to {}", found.name, updated.name);
        }

        AccountCommands::Switch { account } => {
            let found = service.require(&account)?;
            let active = service.switch(settings, found.id)?;
            println!("Active account: {}", active.name);
        }

        AccountCommands::Delete { account, force } => {
            let found = service.require(&account)?;
            let trades = storage.trades.get_by_account(found.id)?.len();

            if !force {
                println!(
                    "About to delete account '{}' and its {} trade(s).",
                    found.name, trades
                );
                println!("To proceed, run again with --force flag:");
                println!("  journal account delete \"{}\" --force", account);
                return Ok(());
            }

            let deletion = service.delete(settings, found.id)?;
            println!(
                "Deleted account: {} ({} trade(s) removed)",
                deletion.account.name, deletion.trades_removed
            );
            if deletion.new_active.is_some() {
                println!("Active account is now the primary account.");
            }
        }
    }

    Ok(())
}
