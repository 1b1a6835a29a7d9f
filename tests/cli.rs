//! Command-line behaviour against a throwaway data directory

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn journal(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("journal").unwrap();
    cmd.env("TRADE_JOURNAL_DATA_DIR", data_dir)
        .env_remove("RUST_LOG");
    cmd
}

fn setup() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    journal(temp_dir.path()).arg("init").assert().success();
    journal(temp_dir.path())
        .args(["account", "create", "Futures", "--balance", "1000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created account: Futures"));
    journal(temp_dir.path())
        .args(["account", "switch", "Futures"])
        .assert()
        .success();
    temp_dir
}

fn open_trade(data_dir: &Path, symbol: &str) {
    journal(data_dir)
        .args([
            "trade", "open", symbol, "long", "--entry", "100", "--stop", "90", "--target", "130",
            "--risk", "1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Opened trade"));
}

#[test]
fn test_init_creates_primary_account() {
    let temp_dir = TempDir::new().unwrap();
    journal(temp_dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialization complete"));

    journal(temp_dir.path())
        .args(["account", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Main Account"));
}

#[test]
fn test_open_and_list_trades() {
    let temp_dir = setup();
    open_trade(temp_dir.path(), "btcusdt");

    journal(temp_dir.path())
        .args(["trade", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("BTCUSDT"));

    journal(temp_dir.path())
        .args(["stats", "summary"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Open risk"));
}

#[test]
fn test_invalid_direction_fails() {
    let temp_dir = setup();
    journal(temp_dir.path())
        .args([
            "trade", "open", "BTC", "sideways", "--entry", "100", "--stop", "90", "--target",
            "130", "--risk", "1",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid direction"));
}

#[test]
fn test_primary_account_cannot_be_deleted() {
    let temp_dir = setup();
    journal(temp_dir.path())
        .args(["account", "delete", "1", "--force"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("primary account"));
}

#[test]
fn test_restore_requires_force() {
    let temp_dir = setup();
    open_trade(temp_dir.path(), "ETH");
    let out_dir = TempDir::new().unwrap();

    journal(temp_dir.path())
        .args(["backup", "export"])
        .arg(out_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Archive created"));

    let archive = fs::read_dir(out_dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .find(|p| p.extension().is_some_and(|ext| ext == "zip"))
        .unwrap();

    journal(temp_dir.path())
        .args(["backup", "restore"])
        .arg(&archive)
        .assert()
        .success()
        .stdout(predicate::str::contains("WARNING"));
}

#[test]
fn test_export_and_restore_into_fresh_journal() {
    let source = setup();
    open_trade(source.path(), "SOL");
    open_trade(source.path(), "ADA");
    let out_dir = TempDir::new().unwrap();

    journal(source.path())
        .args(["backup", "export"])
        .arg(out_dir.path())
        .assert()
        .success();
    let archive = fs::read_dir(out_dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .find(|p| p.extension().is_some_and(|ext| ext == "zip"))
        .unwrap();

    journal(source.path())
        .args(["backup", "inspect"])
        .arg(&archive)
        .assert()
        .success()
        .stdout(predicate::str::contains("Trades"));

    let target = TempDir::new().unwrap();
    journal(target.path()).arg("init").assert().success();
    journal(target.path())
        .args(["backup", "restore", "--force"])
        .arg(&archive)
        .assert()
        .success()
        .stdout(predicate::str::contains("Restore complete!"));

    journal(target.path())
        .args(["trade", "list", "--account", "Futures"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SOL").and(predicate::str::contains("ADA")));

    journal(target.path())
        .args(["backup", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pre-restore-"));

    journal(target.path())
        .arg("audit")
        .assert()
        .success()
        .stdout(predicate::str::contains("RESTORE"));
}

#[test]
fn test_csv_export() {
    let temp_dir = setup();
    open_trade(temp_dir.path(), "DOGE");
    let output = temp_dir.path().join("trades.csv");

    journal(temp_dir.path())
        .args(["export", "trades"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 1 trades"));

    let contents = fs::read_to_string(&output).unwrap();
    assert!(contents.contains("DOGE"));
}
