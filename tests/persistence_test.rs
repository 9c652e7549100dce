#![cfg(feature = "storage-rocksdb")]

use assert_cmd::cargo_bin;
use std::process::Command;
use tempfile::tempdir;

mod common;

#[test]
fn test_rocksdb_retry_across_runs() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    // 1. First run: seed and fail the charge with a network error
    let customers = common::csv_file(&["customer, currency", "1, EUR"]);
    let invoices = common::csv_file(&["customer, amount, currency", "1, 100.0, EUR"]);
    let outcomes = common::csv_file(&["invoice, outcome", "1, network-error"]);

    let output1 = Command::new(cargo_bin!("billing-reconciler"))
        .arg("run")
        .arg("--db-path")
        .arg(&db_path)
        .arg("--customers")
        .arg(customers.path())
        .arg("--invoices")
        .arg(invoices.path())
        .arg("--outcomes")
        .arg(outcomes.path())
        .output()
        .expect("Failed to execute command");
    assert!(output1.status.success());
    let stdout1 = String::from_utf8_lossy(&output1.stdout);
    assert!(stdout1.contains("1,network-failure,PENDING,true,applied,network-error,"));

    // 2. Second run against the same DB: the invoice is still pending and now gets charged
    let output2 = Command::new(cargo_bin!("billing-reconciler"))
        .arg("run")
        .arg("--db-path")
        .arg(&db_path)
        .output()
        .expect("Failed to execute command");
    assert!(output2.status.success());
    let stdout2 = String::from_utf8_lossy(&output2.stdout);
    assert!(stdout2.contains("1,charged,PAID,false,applied,successfully-charged,"));

    // 3. The event log kept every attempt
    let output3 = Command::new(cargo_bin!("billing-reconciler"))
        .arg("events")
        .arg("1")
        .arg("--db-path")
        .arg(&db_path)
        .output()
        .expect("Failed to execute command");
    assert!(output3.status.success());
    let stdout3 = String::from_utf8_lossy(&output3.stdout);
    assert_eq!(stdout3.lines().count(), 4);
    assert!(stdout3.contains(",PENDING,network-error,"));
    assert!(stdout3.contains(",PAID,successfully-charged,"));
}
