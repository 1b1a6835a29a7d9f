//! Trade CLI commands
//!
//! Implements CLI commands for opening, closing and reviewing trades.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::trade::{format_trade_details, format_trade_list};
use crate::error::{JournalError, JournalResult};
use crate::models::trade::parse_trade_date;
use crate::models::{Account, Direction, InlineImage, Trade};
use crate::services::{AccountService, TradeInput, TradeService};
use crate::storage::Storage;

/// Trade subcommands
#[derive(Subcommand)]
pub enum TradeCommands {
    /// Open a new trade
    Open {
        /// Symbol, e.g. BTCUSDT
        symbol: String,
        /// Direction: long/buy or short/sell
        direction: String,
        /// Entry price
        #[arg(short, long)]
        entry: String,
        /// Stop loss price
        #[arg(short, long)]
        stop: String,
        /// Take profit price
        #[arg(short, long)]
        target: String,
        /// Percent of the balance to risk
        #[arg(short, long)]
        risk: f64,
        /// Total fee percent (defaults to the configured fee)
        #[arg(short, long)]
        fee: Option<f64>,
        /// Entry time (YYYY-MM-DDTHH:MM, defaults to now)
        #[arg(short, long)]
        date: Option<String>,
        /// Account name or ID (defaults to the active account)
        #[arg(short, long)]
        account: Option<String>,
        /// Chart screenshot at entry
        #[arg(long)]
        screenshot: Option<PathBuf>,
    },
    /// Close an open trade
    Close {
        /// Trade ID or UID
        trade: String,
        /// Close price
        price: f64,
        /// Chart screenshot at exit
        #[arg(long)]
        screenshot: Option<PathBuf>,
    },
    /// Re-enter a trade's prices and risk
    Edit {
        /// Trade ID or UID
        trade: String,
        #[arg(short, long)]
        entry: Option<String>,
        #[arg(short, long)]
        stop: Option<String>,
        #[arg(short, long)]
        target: Option<String>,
        #[arg(short, long)]
        risk: Option<f64>,
        #[arg(short, long)]
        fee: Option<f64>,
    },
    /// Delete a trade
    Delete {
        /// Trade ID or UID
        trade: String,
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
    /// List trades of an account, newest first
    List {
        /// Account name or ID (defaults to the active account)
        #[arg(short, long)]
        account: Option<String>,
        /// Only open trades
        #[arg(long, conflicts_with = "closed")]
        open: bool,
        /// Only closed trades
        #[arg(long)]
        closed: bool,
        /// Number of trades to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Show trade details
    Show {
        /// Trade ID or UID
        trade: String,
    },
}

fn resolve_account(
    service: &AccountService<'_>,
    settings: &Settings,
    account: Option<&str>,
) -> JournalResult<Account> {
    match account {
        Some(identifier) => service.require(identifier),
        None => service.active(settings),
    }
}

fn load_image(path: &Path) -> JournalResult<InlineImage> {
    let bytes = fs::read(path)
        .map_err(|e| JournalError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok(InlineImage::from_file_bytes(&name, bytes))
}

fn edit_input(
    trade: &Trade,
    entry: Option<String>,
    stop: Option<String>,
    target: Option<String>,
    risk: Option<f64>,
    fee: Option<f64>,
) -> TradeInput {
    TradeInput {
        symbol: trade.symbol.clone(),
        date: trade.date,
        direction: trade.direction,
        entry: entry.unwrap_or_else(|| trade.entry_display()),
        stop: stop.unwrap_or_else(|| trade.stop_display()),
        target: target.unwrap_or_else(|| trade.target_display()),
        risk_percent: risk.unwrap_or(trade.risk_percent),
        fee_percent: fee.unwrap_or(trade.total_fee_percent),
    }
}

/// Handle a trade command
pub fn handle_trade_command(
    storage: &Storage,
    settings: &Settings,
    cmd: TradeCommands,
) -> JournalResult<()> {
    let accounts = AccountService::new(storage);
    let service = TradeService::new(storage);
    let currency = settings.currency_symbol.as_str();

    match cmd {
        TradeCommands::Open {
            symbol,
            direction,
            entry,
            stop,
            target,
            risk,
            fee,
            date,
            account,
            screenshot,
        } => {
            let account = resolve_account(&accounts, settings, account.as_deref())?;
            let direction = Direction::parse(&direction).ok_or_else(|| {
                JournalError::Validation(format!(
                    "Invalid direction: '{}'. Use long/buy or short/sell",
                    direction
                ))
            })?;
            let date = match date {
                Some(text) => parse_trade_date(&text).ok_or_else(|| {
                    JournalError::Validation(format!(
                        "Invalid date: '{}'. Use YYYY-MM-DDTHH:MM",
                        text
                    ))
                })?,
                None => Local::now().naive_local(),
            };
            let image = screenshot.as_deref().map(load_image).transpose()?;

            let input = TradeInput {
                symbol,
                date,
                direction,
                entry,
                stop,
                target,
                risk_percent: risk,
                fee_percent: fee.unwrap_or(settings.default_fee_percent),
            };
            let trade = service.open(account.id, input, image)?;

            println!("Opened trade {} on {}", trade.id, account.name);
            println!(
                "  {} {} @ {}  stop {}  target {}",
                trade.direction,
                trade.symbol,
                trade.entry_display(),
                trade.stop_display(),
                trade.target_display()
            );
            println!(
                "  Risk {}{:.2}  size {:.6}  value {}{:.2}  R:R {:.2}",
                currency,
                trade.total_risk_amount,
                trade.position_size,
                currency,
                trade.position_value,
                trade.risk_reward_ratio
            );
        }

        TradeCommands::Close {
            trade,
            price,
            screenshot,
        } => {
            let found = service.show(&trade)?;
            let image = screenshot.as_deref().map(load_image).transpose()?;
            let closed = service.close(found.id, price, image)?;
            let pnl = closed.pnl();
            println!(
                "Closed trade {} at {}: {}{}{:.2}",
                closed.id,
                price,
                if pnl >= 0.0 { "+" } else { "-" },
                currency,
                pnl.abs()
            );
        }

        TradeCommands::Edit {
            trade,
            entry,
            stop,
            target,
            risk,
            fee,
        } => {
            let found = service.show(&trade)?;
            let input = edit_input(&found, entry, stop, target, risk, fee);
            let updated = service.edit(found.id, input)?;
            println!("Updated trade {}", updated.id);
            println!(
                "  Risk {}{:.2}  size {:.6}  R:R {:.2}",
                currency, updated.total_risk_amount, updated.position_size, updated.risk_reward_ratio
            );
        }

        TradeCommands::Delete { trade, force } => {
            let found = service.show(&trade)?;
            if !force {
                println!(
                    "About to delete trade {} ({} {}).",
                    found.id, found.direction, found.symbol
                );
                println!("To proceed, run again with --force flag:");
                println!("  journal trade delete {} --force", trade);
                return Ok(());
            }
            service.delete(found.id)?;
            println!("Deleted trade {}", found.id);
        }

        TradeCommands::List {
            account,
            open,
            closed,
            limit,
        } => {
            let account = resolve_account(&accounts, settings, account.as_deref())?;
            let trades: Vec<Trade> = service
                .list(account.id)?
                .into_iter()
                .filter(|t| (!open || t.is_open()) && (!closed || t.is_closed()))
                .take(limit)
                .collect();

            println!("Account: {}", account.name);
            print!("{}", format_trade_list(&trades, currency));
        }

        TradeCommands::Show { trade } => {
            let found = service.show(&trade)?;
            let account_name = accounts
                .get(found.account_id)?
                .map(|a| a.name)
                .unwrap_or_else(|| "Unknown".to_string());
            print!("{}", format_trade_details(&found, &account_name, currency));
        }
    }

    Ok(())
}
