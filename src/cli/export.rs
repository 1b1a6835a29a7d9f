//! CLI commands for spreadsheet export
//!
//! Full-journal archives live under `backup export`; these commands write CSV.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::error::{JournalError, JournalResult};
use crate::export::{export_accounts_csv, export_trades_csv};
use crate::services::AccountService;
use crate::storage::Storage;

/// Export subcommands
#[derive(Subcommand, Debug)]
pub enum ExportCommands {
    /// Export trades to CSV
    Trades {
        /// Output file path
        output: PathBuf,
        /// Only trades of this account (name or ID)
        #[arg(short, long)]
        account: Option<String>,
        /// Include every account
        #[arg(long, conflicts_with = "account")]
        all: bool,
    },

    /// Export accounts to CSV
    Accounts {
        /// Output file path
        output: PathBuf,
    },
}

fn create_output(output: &Path) -> JournalResult<BufWriter<File>> {
    let file = File::create(output).map_err(|e| {
        JournalError::Export(format!("Failed to create file {}: {}", output.display(), e))
    })?;
    Ok(BufWriter::new(file))
}

/// Handle export commands
pub fn handle_export_command(
    storage: &Storage,
    settings: &Settings,
    cmd: ExportCommands,
) -> JournalResult<()> {
    match cmd {
        ExportCommands::Trades {
            output,
            account,
            all,
        } => {
            let service = AccountService::new(storage);
            let account = match (account, all) {
                (_, true) => None,
                (Some(identifier), false) => Some(service.require(&identifier)?),
                (None, false) => Some(service.active(settings)?),
            };

            let count = export_trades_csv(
                storage,
                account.as_ref().map(|a| a.id),
                create_output(&output)?,
            )?;
            match account {
                Some(account) => println!(
                    "Exported {} trades of {} to: {}",
                    count,
                    account.name,
                    output.display()
                ),
                None => println!("Exported {} trades to: {}", count, output.display()),
            }
        }

        ExportCommands::Accounts { output } => {
            let count = export_accounts_csv(storage, create_output(&output)?)?;
            println!("Exported {} accounts to: {}", count, output.display());
        }
    }

    Ok(())
}
