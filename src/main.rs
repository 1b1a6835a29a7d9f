use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use trade_journal::backup::CancelToken;
use trade_journal::cli::{
    handle_account_command, handle_audit_command, handle_backup_command, handle_export_command,
    handle_stats_command, handle_trade_command,
};
use trade_journal::config::{paths::JournalPaths, settings::Settings};
use trade_journal::storage::Storage;

#[derive(Parser)]
#[command(
    name = "journal",
    author = "Kaylee Beyene",
    version,
    about = "Local trading journal with position sizing and archive backups",
    long_about = "A terminal trading journal. Size positions from the risk you take, \
                  attach chart screenshots, review your statistics, and move the whole \
                  journal in and out of zip archives with a resumable restore."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Account management commands
    #[command(subcommand)]
    Account(trade_journal::cli::AccountCommands),

    /// Trade commands
    #[command(subcommand)]
    Trade(trade_journal::cli::TradeCommands),

    /// Performance statistics
    #[command(subcommand)]
    Stats(trade_journal::cli::StatsCommands),

    /// Archive export, restore and safety backups
    #[command(subcommand)]
    Backup(trade_journal::cli::BackupCommands),

    /// CSV export
    #[command(subcommand)]
    Export(trade_journal::cli::ExportCommands),

    /// Show the audit log
    Audit {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Initialize a new journal
    Init,

    /// Show current configuration and paths
    Config,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    // Initialize paths and settings
    let paths = JournalPaths::new()?;
    let mut settings = Settings::load_or_create(&paths)?;

    // Initialize storage
    let mut storage = Storage::open(paths.clone(), &settings)?;
    storage.load_all()?;

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("\nStopping after the current step...");
        handler_token.cancel();
    }) {
        warn!(error = %e, "Could not install interrupt handler");
    }

    match cli.command {
        Some(Commands::Account(cmd)) => {
            handle_account_command(&storage, &mut settings, cmd)?;
        }
        Some(Commands::Trade(cmd)) => {
            handle_trade_command(&storage, &settings, cmd)?;
        }
        Some(Commands::Stats(cmd)) => {
            handle_stats_command(&storage, &settings, cmd)?;
        }
        Some(Commands::Backup(cmd)) => {
            handle_backup_command(&mut storage, &mut settings, cmd, &cancel)?;
        }
        Some(Commands::Export(cmd)) => {
            handle_export_command(&storage, &settings, cmd)?;
        }
        Some(Commands::Audit { limit }) => {
            handle_audit_command(&storage, limit)?;
        }
        Some(Commands::Init) => {
            println!("Initializing trade journal at: {}", paths.base_dir().display());
            trade_journal::storage::init::initialize_storage(&paths)?;
            settings.save(&paths)?;
            println!("Initialization complete!");
            println!();
            println!("A primary account has been created.");
            println!("Run 'journal account list' to see your accounts.");
        }
        Some(Commands::Config) => {
            println!("Trade Journal Configuration");
            println!("===========================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Data directory:   {}", paths.data_dir().display());
            println!("Backup directory: {}", paths.backup_dir().display());
            println!();
            println!("Settings:");
            println!("  Active account:      {}", settings.active_account_id);
            println!("  Currency symbol:     {}", settings.currency_symbol);
            println!("  Default fee percent: {}", settings.default_fee_percent);
            println!("  Restore batch size:  {}", settings.restore.batch_size);
            println!("  Safety backups kept: {}", settings.restore.keep_safety_backups);
            match settings.storage_quota_bytes {
                Some(quota) => println!("  Storage quota:       {} bytes", quota),
                None => println!("  Storage quota:       none"),
            }
        }
        None => {
            println!("Trade Journal - local trading journal");
            println!();
            println!("Run 'journal --help' for usage information.");
        }
    }

    Ok(())
}
