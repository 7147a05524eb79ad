//! End-to-end tests for the smelter binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn smelter(data_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_smelter"))
        .arg("--data-dir")
        .arg(data_dir)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run smelter")
}

fn json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

fn load(dir: &TempDir, content: &str) {
    let source = dir.path().join("upload.csv");
    fs::write(&source, content).unwrap();
    let output = smelter(
        &dir.path().join("data"),
        &["load", source.to_str().unwrap(), "--project", "catalog", "--json"],
    );
    let summary = json(&output);
    assert_eq!(summary["project"], "catalog");
    assert_eq!(summary["summary"]["source_deleted"], true);
    assert!(!source.exists(), "source should be removed after loading");
}

#[test]
fn test_load_keep_source() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("upload.csv");
    fs::write(&source, "search_ref,brand\nA1,X\n").unwrap();

    let output = smelter(
        &dir.path().join("data"),
        &["load", source.to_str().unwrap(), "--keep-source", "--json"],
    );
    let summary = json(&output);
    assert_eq!(summary["summary"]["source_deleted"], false);
    assert!(source.exists());
}

#[test]
fn test_load_diagnose_fix() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");
    load(&dir, "search_ref,brand,barcode\nab1,ACME,123456789012\n");

    let report = json(&smelter(&data, &["diagnose", "catalog", "--json"]));
    assert_eq!(report["uppercase_issues"], serde_json::json!(["search_ref"]));

    let fixed = json(&smelter(&data, &["fix", "catalog", "barcode", "--json"]));
    assert_eq!(fixed["rows_affected"], 1);

    let preview = json(&smelter(&data, &["preview", "catalog", "--json"]));
    assert_eq!(preview["rows"][0]["barcode"], "1234567890128");
}

#[test]
fn test_read_only_query_rejects_statements() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");
    load(&dir, "search_ref,brand\nA1,X\n");

    let output = smelter(
        &data,
        &["query", "catalog", "DELETE FROM raw_data", "--read-only"],
    );
    assert!(!output.status.success());

    let rows = json(&smelter(
        &data,
        &["query", "catalog", "SELECT COUNT(*) AS n FROM raw_data", "--json"],
    ));
    assert_eq!(rows["data"][0]["n"], 1);
}

#[test]
fn test_duplicates_and_delete() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");
    load(&dir, "search_ref,brand\nA1,X\nA1,X\nB2,Y\n");

    let analysis = json(&smelter(&data, &["duplicates", "catalog", "--json"]));
    assert_eq!(analysis["total_duplicates"], 1);

    let removed = json(&smelter(&data, &["duplicates", "catalog", "--remove", "--json"]));
    assert_eq!(removed["rows_affected"], 1);

    let deleted = json(&smelter(&data, &["delete", "catalog", "--json"]));
    assert_eq!(deleted["deleted"], true);

    let output = smelter(&data, &["diagnose", "catalog"]);
    assert!(!output.status.success());
}

#[test]
fn test_invalid_project_id() {
    let dir = TempDir::new().unwrap();
    let output = smelter(dir.path(), &["diagnose", "../etc"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error"));
}
