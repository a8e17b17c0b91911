//! Command-line tests run against a throwaway data directory

use assert_cmd::Command;
use chrono::NaiveDate;
use predicates::prelude::*;
use tempfile::TempDir;

use splitbook::config::SplitbookPaths;
use splitbook::models::{AccountId, CategoryId, Money, PayeeId, Transaction};
use splitbook::session::{BatchPersistence, Changes};
use splitbook::storage::Storage;

fn splitbook(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("splitbook").unwrap();
    cmd.env("SPLITBOOK_DATA_DIR", dir.path());
    cmd.env_remove("SPLITBOOK_LOG");
    cmd
}

/// The id printed on the "Transaction:" line
fn created_id(stdout: &[u8]) -> String {
    String::from_utf8_lossy(stdout)
        .lines()
        .find_map(|l| l.strip_prefix("Transaction: "))
        .map(|id| id.trim().to_string())
        .expect("no transaction id in output")
}

fn seed_reconciled(dir: &TempDir) -> Transaction {
    let paths = SplitbookPaths::with_base_dir(dir.path().to_path_buf());
    let mut storage = Storage::new(paths).unwrap();
    storage.load_all().unwrap();

    let mut txn = Transaction::new(
        Some(AccountId::new()),
        NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
        Money::from_cents(4200),
    );
    txn.reconciled = true;
    storage
        .batch_update(&Changes {
            added: vec![txn.clone()],
            ..Changes::default()
        })
        .unwrap();
    txn
}

#[test]
fn config_shows_defaults() {
    let dir = TempDir::new().unwrap();
    splitbook(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Date format:          MM/dd/yyyy"))
        .stdout(predicate::str::contains("Page size:            25"));
}

#[test]
fn config_rejects_unknown_date_format() {
    let dir = TempDir::new().unwrap();
    splitbook(&dir)
        .args(["config", "--date-format", "yyyy/dd/MM"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown date format"));
}

#[test]
fn add_without_account_fails() {
    let dir = TempDir::new().unwrap();
    splitbook(&dir)
        .args(["txn", "add", "12.00"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("needs an account"));
}

#[test]
fn add_split_then_list_and_show() {
    let dir = TempDir::new().unwrap();
    let account = AccountId::new().as_uuid().to_string();
    let category = CategoryId::new();

    let output = splitbook(&dir)
        .args(["txn", "add", "100.00", "--account", &account])
        .args(["--date", "03/01/2025"])
        .arg(format!("--leg=60:{}", category.as_uuid()))
        .arg("--leg=40")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Created transaction: 3 added, 0 updated, 0 deleted",
        ))
        .stdout(predicate::str::contains("Splits:"))
        .get_output()
        .stdout
        .clone();
    let id = created_id(&output);

    splitbook(&dir)
        .args(["txn", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("03/01/2025"))
        .stdout(predicate::str::contains("[split]"))
        .stdout(predicate::str::contains("Page 1 (1 transactions)"));

    splitbook(&dir)
        .args(["txn", "show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("$60.00 to {}", category)))
        .stdout(predicate::str::contains("Unallocated").not());
}

#[test]
fn unbalanced_legs_are_not_saved() {
    let dir = TempDir::new().unwrap();
    let account = AccountId::new().as_uuid().to_string();

    splitbook(&dir)
        .args(["txn", "add", "100.00", "--account", &account])
        .args(["--leg=60", "--leg=30"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("$10.00 unallocated"));

    splitbook(&dir)
        .args(["txn", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No transactions found."));
}

#[test]
fn second_add_reuses_last_account() {
    let dir = TempDir::new().unwrap();
    let account = AccountId::new().as_uuid().to_string();

    splitbook(&dir)
        .args(["txn", "add", "5.00", "--account", &account])
        .assert()
        .success();

    splitbook(&dir)
        .args(["txn", "add", "7.50"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Account:     {}", account)));
}

#[test]
fn edit_field_of_saved_transaction() {
    let dir = TempDir::new().unwrap();
    let account = AccountId::new().as_uuid().to_string();

    let output = splitbook(&dir)
        .args(["txn", "add", "20.00", "--account", &account])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let id = created_id(&output);

    splitbook(&dir)
        .args(["txn", "edit", &id, "--field", "memo", "--value", "refund"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 added, 1 updated, 0 deleted"))
        .stdout(predicate::str::contains("Notes:       refund"));

    splitbook(&dir)
        .args(["txn", "edit", &id, "--field", "colour", "--value", "red"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown field"));
}

#[test]
fn rule_fills_new_transaction() {
    let dir = TempDir::new().unwrap();
    let account = AccountId::new().as_uuid().to_string();
    let payee = PayeeId::new().as_uuid().to_string();
    let category = CategoryId::new();

    splitbook(&dir)
        .args(["rule", "set", &payee, "--notes", "coffee"])
        .args(["--category", &category.as_uuid().to_string()])
        .assert()
        .success();

    splitbook(&dir)
        .args(["txn", "add", "3.50", "--account", &account, "--payee", &payee])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Category:    {}", category)))
        .stdout(predicate::str::contains("Notes:       coffee"));
}

#[test]
fn reconciled_delete_needs_yes() {
    let dir = TempDir::new().unwrap();
    let txn = seed_reconciled(&dir);
    let id = txn.id.to_string();

    splitbook(&dir)
        .args(["txn", "delete", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("reconciled"))
        .stdout(predicate::str::contains("--yes"));

    splitbook(&dir)
        .args(["txn", "show", &id])
        .assert()
        .success();

    splitbook(&dir)
        .args(["txn", "delete", &id, "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 added, 0 updated, 1 deleted"));

    splitbook(&dir)
        .args(["txn", "show", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Transaction not found"));

    splitbook(&dir)
        .arg("audit")
        .assert()
        .success()
        .stdout(predicate::str::contains("DELETE"));
}

#[test]
fn unlock_needs_yes_then_allows_plain_delete() {
    let dir = TempDir::new().unwrap();
    let txn = seed_reconciled(&dir);
    let id = txn.id.to_string();

    splitbook(&dir)
        .args(["txn", "unlock", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Unlocking"))
        .stdout(predicate::str::contains("--yes"));

    splitbook(&dir)
        .args(["txn", "unlock", &id, "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 added, 1 updated, 0 deleted"));

    splitbook(&dir)
        .args(["txn", "unlock", &id, "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not reconciled"));

    splitbook(&dir)
        .args(["txn", "delete", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 added, 0 updated, 1 deleted"));
}

#[test]
fn oversized_split_fails_cleanly() {
    let dir = TempDir::new().unwrap();
    let account = AccountId::new().as_uuid().to_string();

    splitbook(&dir)
        .args(["txn", "add", "92233720368547758.07", "--account", &account])
        .arg("--leg=-0.01")
        .assert()
        .failure()
        .stderr(predicate::str::contains("too large"));

    splitbook(&dir)
        .args(["txn", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No transactions found."));
}

#[test]
fn zero_leg_is_rejected() {
    let dir = TempDir::new().unwrap();
    let account = AccountId::new().as_uuid().to_string();

    splitbook(&dir)
        .args(["txn", "add", "10.00", "--account", &account])
        .args(["--leg=0", "--leg=10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must not be zero"));
}
