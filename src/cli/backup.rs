//! Backup CLI commands
//!
//! Implements CLI commands for exporting, inspecting and restoring journal
//! archives, and for the safety archives taken before each restore.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Subcommand;

use crate::backup::{
    BackupManager, CancelToken, ExportOutcome, Progress, RestoreConfirmation, RestoreOutcome,
};
use crate::config::settings::Settings;
use crate::error::{JournalError, JournalResult};
use crate::storage::Storage;

/// Backup subcommands
#[derive(Subcommand)]
pub enum BackupCommands {
    /// Export the whole journal to a zip archive
    Export {
        /// Directory to write crypto-journal-<date>.zip into
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
    /// Replace the journal with the contents of an archive
    Restore {
        /// Archive path, safety backup filename, or "latest"
        archive: String,
        /// Confirm overwriting all current data
        #[arg(short, long)]
        force: bool,
        /// Do not archive the current journal first
        #[arg(long)]
        no_safety_backup: bool,
    },
    /// Show what an archive holds without restoring it
    Inspect {
        /// Archive path, safety backup filename, or "latest"
        archive: String,
    },
    /// Show or clear the saved restore checkpoint
    Checkpoint {
        /// Forget the checkpoint so the next restore starts over
        #[arg(long)]
        clear: bool,
    },
    /// List safety backups
    List {
        /// Show detailed information
        #[arg(short, long)]
        verbose: bool,
    },
    /// Delete safety backups beyond the retention count
    Prune {
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

/// Handle a backup command
pub fn handle_backup_command(
    storage: &mut Storage,
    settings: &mut Settings,
    cmd: BackupCommands,
    cancel: &CancelToken,
) -> JournalResult<()> {
    let manager = BackupManager::new(storage.paths().clone(), settings.restore.clone());

    match cmd {
        BackupCommands::Export { dir } => {
            println!("Exporting journal...");
            let mut progress = print_progress;
            match manager.export(storage, &dir, cancel, &mut progress)? {
                ExportOutcome::Completed { path, stats } => {
                    eprintln!();
                    println!("Archive created: {}", path.display());
                    println!(
                        "  {} account(s), {} trade(s), {} image(s)",
                        stats.accounts, stats.trades, stats.images
                    );
                }
                ExportOutcome::Cancelled => {
                    eprintln!();
                    println!("Export cancelled. No archive was written.");
                }
            }
        }

        BackupCommands::Restore {
            archive,
            force,
            no_safety_backup,
        } => {
            let path = resolve_backup_path(&manager, &archive)?;
            let summary = manager.inspect(&path)?;

            println!("Archive: {}", path.display());
            print!("{}", summary.format_terminal());
            println!();

            if let Some(checkpoint) = manager.checkpoints().load() {
                if checkpoint.total == summary.trades {
                    println!(
                        "A previous restore stopped at trade {} of {}; it will resume.",
                        checkpoint.index, checkpoint.total
                    );
                }
            }

            if !force {
                println!("WARNING: This will overwrite ALL current data!");
                println!("To proceed, run again with --force flag:");
                println!("  journal backup restore {} --force", archive);
                return Ok(());
            }

            let confirmation = RestoreConfirmation::from_answer(force)?;
            let mut progress = print_progress;
            let outcome = manager.restore(
                storage,
                settings,
                &path,
                confirmation,
                !no_safety_backup,
                cancel,
                &mut progress,
            )?;
            eprintln!();

            match &outcome {
                RestoreOutcome::Completed(report) => {
                    println!("Restore complete!");
                    println!("{}", report.summary());
                    if !report.images.missing.is_empty() {
                        println!("\nScreenshots not found in the archive:");
                        for name in &report.images.missing {
                            println!("  {}", name);
                        }
                    }
                    if !report.skipped.is_empty() {
                        println!("\nTrades that could not be written:");
                        for record in &report.skipped {
                            println!("  {}", record);
                        }
                    }
                }
                RestoreOutcome::Cancelled { checkpoint, report } => {
                    println!("Restore cancelled.");
                    println!("{}", report.summary());
                    match checkpoint {
                        Some(checkpoint) => println!(
                            "Progress saved at trade {} of {}. Run the same restore again to resume.",
                            checkpoint.index, checkpoint.total
                        ),
                        None => println!("Nothing was changed."),
                    }
                }
            }
        }

        BackupCommands::Inspect { archive } => {
            let path = resolve_backup_path(&manager, &archive)?;
            let summary = manager.inspect(&path)?;
            println!("Archive: {}", path.display());
            print!("{}", summary.format_terminal());
        }

        BackupCommands::Checkpoint { clear } => {
            let checkpoints = manager.checkpoints();
            match checkpoints.load() {
                Some(checkpoint) if clear => {
                    checkpoints.clear();
                    println!(
                        "Cleared checkpoint at trade {} of {}.",
                        checkpoint.index, checkpoint.total
                    );
                }
                Some(checkpoint) => {
                    println!(
                        "Restore checkpoint: trade {} of {}",
                        checkpoint.index, checkpoint.total
                    );
                    if let Some(saved_at) = checkpoint.saved_at {
                        println!("Saved: {}", saved_at.format("%Y-%m-%d %H:%M:%S UTC"));
                    }
                }
                None => println!("No restore checkpoint."),
            }
        }

        BackupCommands::List { verbose } => {
            let backups = manager.list_backups()?;

            if backups.is_empty() {
                println!("No safety backups found.");
                println!("One is created automatically before each restore.");
                return Ok(());
            }

            println!("Safety Backups");
            println!("==============");
            println!();

            for (i, backup) in backups.iter().enumerate() {
                let age = chrono::Utc::now().signed_duration_since(backup.created_at);

                if verbose {
                    println!(
                        "{}. {}\n   Created: {}\n   Size: {}\n   Age: {}\n",
                        i + 1,
                        backup.filename,
                        backup.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
                        format_size(backup.size_bytes),
                        format_duration(age),
                    );
                } else {
                    println!(
                        "  {}. {} ({} ago, {})",
                        i + 1,
                        backup.filename,
                        format_duration(age),
                        format_size(backup.size_bytes),
                    );
                }
            }

            println!();
            println!("Total: {} backup(s)", backups.len());
        }

        BackupCommands::Prune { force } => {
            let backups = manager.list_backups()?;
            let keep = settings.restore.keep_safety_backups;
            let to_delete = backups.len().saturating_sub(keep);

            if to_delete == 0 {
                println!("No backups to prune.");
                println!("Keeping up to {} safety backup(s); you have {}.", keep, backups.len());
                return Ok(());
            }

            println!("{} of {} safety backup(s) would be deleted.", to_delete, backups.len());
            if !force {
                println!("To delete old backups, run again with --force flag:");
                println!("  journal backup prune --force");
                return Ok(());
            }

            let deleted = manager.enforce_retention()?;
            println!("Deleted {} backup(s).", deleted.len());
        }
    }

    Ok(())
}

fn print_progress(progress: &Progress) {
    eprint!("\r{:<60}", progress.to_string());
    let _ = std::io::stderr().flush();
}

/// Resolve an archive identifier to a full path
fn resolve_backup_path(manager: &BackupManager, archive: &str) -> JournalResult<PathBuf> {
    if archive.eq_ignore_ascii_case("latest") {
        return manager
            .get_latest_backup()?
            .map(|b| b.path)
            .ok_or_else(|| JournalError::NotFound {
                entity_type: "Backup",
                identifier: "latest".to_string(),
            });
    }

    let path = Path::new(archive);
    if path.exists() {
        return Ok(path.to_path_buf());
    }

    let in_backup_dir = manager.backup_dir().join(archive);
    if in_backup_dir.exists() {
        return Ok(in_backup_dir);
    }

    let with_ext = manager.backup_dir().join(format!("{}.zip", archive));
    if with_ext.exists() {
        return Ok(with_ext);
    }

    Err(JournalError::NotFound {
        entity_type: "Backup",
        identifier: archive.to_string(),
    })
}

/// Format a duration in human-readable form
fn format_duration(duration: chrono::Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);

    if total_seconds < 60 {
        return format!("{}s", total_seconds);
    }

    let minutes = total_seconds / 60;
    if minutes < 60 {
        return format!("{}m", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }

    format!("{}d", hours / 24)
}

/// Format a file size in human-readable form
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::JournalPaths;
    use crate::config::settings::RestoreSettings;
    use tempfile::TempDir;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(chrono::Duration::seconds(42)), "42s");
        assert_eq!(format_duration(chrono::Duration::minutes(5)), "5m");
        assert_eq!(format_duration(chrono::Duration::hours(3)), "3h");
        assert_eq!(format_duration(chrono::Duration::days(40)), "40d");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_resolve_latest_without_backups() {
        let temp_dir = TempDir::new().unwrap();
        let paths = JournalPaths::with_base_dir(temp_dir.path().to_path_buf());
        let manager = BackupManager::new(paths, RestoreSettings::default());

        let err = resolve_backup_path(&manager, "latest").unwrap_err();
        assert!(err.is_not_found());
    }
}
