//! Tests for the diagnostic battery.

use std::collections::BTreeSet;
use std::fs;

use tempfile::TempDir;

use smelter::diagnosis::DiagnosticEngine;
use smelter::store::{AccessMode, Dataset, LoadOptions};
use smelter::{Finding, RuleFamily, SmelterError};

/// Load `content` into a fresh store inside `dir`.
fn load_dataset(dir: &TempDir, content: &str) -> Dataset {
    let source = dir.path().join("upload.csv");
    fs::write(&source, content).expect("Failed to write upload");
    let dataset = Dataset::open(dir.path().join("project.sqlite"));
    dataset
        .load(&source, &LoadOptions::default())
        .expect("Load failed");
    dataset
}

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// One clean row and two rows with problems in nearly every field.
const MIXED: &str = "\
search_ref,manufacturer_ref,name,brand,ncm,barcode,gross_weight,net_weight,width,height,depth
ABC123,MFR-001,WIDGET,ACME,84713012,1234567890128,2.0,1.5,10,20,30
ab,M 1,gadget,1234,8471.30-12,12345,1.0,2.0,0,20,30
XYZ789,MFR#3,SPROCKET,,,,nan,,1500,20,30
";

// =============================================================================
// Full Diagnosis
// =============================================================================

#[test]
fn test_diagnose_mixed_dataset() {
    let dir = TempDir::new().unwrap();
    let dataset = load_dataset(&dir, MIXED);

    let report = DiagnosticEngine::new().diagnose(&dataset).unwrap();

    assert_eq!(report.uppercase_issues, set(&["name", "search_ref"]));
    assert_eq!(report.null_string_issues, set(&["brand", "ncm"]));
    assert_eq!(report.null_numeric_issues, set(&["gross_weight", "net_weight"]));
    assert_eq!(report.brand_issues, 2);
    assert_eq!(report.ncm_issues, 1);
    assert_eq!(report.barcode_issues, 1);
    assert_eq!(report.weight_issues, 1);
    assert_eq!(report.dimension_issues, 2);
    assert_eq!(report.search_ref_issues, 1);
    assert_eq!(report.manufacturer_ref_issues, 2);
    assert_eq!(report.total_issues(), 16);
}

#[test]
fn test_clean_dataset() {
    let dir = TempDir::new().unwrap();
    let dataset = load_dataset(
        &dir,
        "search_ref,manufacturer_ref,name,brand,ncm,barcode\n\
         ABC123,MFR-001,WIDGET,ACME,84713012,12345678\n",
    );

    let report = DiagnosticEngine::new().diagnose(&dataset).unwrap();
    assert!(report.is_clean(), "unexpected issues: {:?}", report);
    assert!(report.affected_families().is_empty());
}

#[test]
fn test_diagnosis_is_repeatable() {
    let dir = TempDir::new().unwrap();
    let dataset = load_dataset(&dir, MIXED);
    let engine = DiagnosticEngine::new();

    let first = engine.diagnose(&dataset).unwrap();
    let second = engine.diagnose(&dataset).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_diagnosis_does_not_mutate() {
    let dir = TempDir::new().unwrap();
    let dataset = load_dataset(&dir, MIXED);

    let before = dataset.preview(1, 10).unwrap();
    DiagnosticEngine::new().diagnose(&dataset).unwrap();
    let after = dataset.preview(1, 10).unwrap();

    assert_eq!(before.rows, after.rows);
}

#[test]
fn test_missing_store() {
    let dir = TempDir::new().unwrap();
    let dataset = Dataset::open(dir.path().join("absent.sqlite"));

    assert!(matches!(
        DiagnosticEngine::new().diagnose(&dataset),
        Err(SmelterError::NotFound(_))
    ));
}

// =============================================================================
// Absent Columns
// =============================================================================

#[test]
fn test_absent_columns_are_skipped() {
    let dir = TempDir::new().unwrap();
    let dataset = load_dataset(&dir, "name,color\nwidget,red\n");
    let engine = DiagnosticEngine::new();

    assert_eq!(engine.brand_issues(&dataset).unwrap(), 0);
    assert_eq!(engine.ncm_issues(&dataset).unwrap(), 0);
    assert_eq!(engine.barcode_issues(&dataset).unwrap(), 0);
    assert_eq!(engine.dimension_issues(&dataset).unwrap(), 0);
    assert_eq!(engine.search_ref_issues(&dataset).unwrap(), 0);
    assert_eq!(engine.manufacturer_ref_issues(&dataset).unwrap(), 0);
    assert_eq!(
        engine.uppercase_issues(&dataset, ["name", "brand"]).unwrap(),
        set(&["name"])
    );
}

#[test]
fn test_weight_requires_both_columns() {
    let dir = TempDir::new().unwrap();
    let dataset = load_dataset(&dir, "gross_weight\n-5\n");

    assert_eq!(DiagnosticEngine::new().weight_issues(&dataset).unwrap(), 0);
}

// =============================================================================
// Family Rules
// =============================================================================

#[test]
fn test_weight_rules() {
    let dir = TempDir::new().unwrap();
    let dataset = load_dataset(
        &dir,
        "gross_weight,net_weight\n\
         5,10\n\
         0,0\n\
         10,5\n\
         -1,-2\n\
         heavy,5\n\
         ,3\n",
    );

    // gross < net, both zero, and negatives count; unparseable values do not.
    assert_eq!(DiagnosticEngine::new().weight_issues(&dataset).unwrap(), 3);
}

#[test]
fn test_dimension_rules() {
    let dir = TempDir::new().unwrap();
    let dataset = load_dataset(
        &dir,
        "width,height\n\
         10,20\n\
         0,20\n\
         10,1000\n\
         10,1000.5\n\
         -3,5\n\
         wide,\n",
    );

    assert_eq!(DiagnosticEngine::new().dimension_issues(&dataset).unwrap(), 3);
}

#[test]
fn test_brand_rules() {
    let dir = TempDir::new().unwrap();
    let dataset = load_dataset(
        &dir,
        "brand\n\
         ACME\n\
         Bolt Co.\n\
         A\n\
         12345\n\
         AC&ME\n\
         \"\"\n\
         3M\n",
    );

    // "A" (too short), "12345" (digits), "AC&ME" (symbol), "" (null).
    assert_eq!(DiagnosticEngine::new().brand_issues(&dataset).unwrap(), 4);
}

#[test]
fn test_ncm_rules() {
    let dir = TempDir::new().unwrap();
    let dataset = load_dataset(
        &dir,
        "ncm\n\
         84713012\n\
         8471.30.12\n\
         8471301\n\
         8471A012\n\
         8471-3012\n\
         \"\"\n",
    );

    assert_eq!(DiagnosticEngine::new().ncm_issues(&dataset).unwrap(), 3);
}

#[test]
fn test_barcode_rules() {
    let dir = TempDir::new().unwrap();
    let dataset = load_dataset(
        &dir,
        "barcode\n\
         12345678\n\
         123456789012\n\
         1234567890128\n\
         1234567\n\
         12345678901A\n\
         \"\"\n",
    );

    assert_eq!(DiagnosticEngine::new().barcode_issues(&dataset).unwrap(), 2);
}

#[test]
fn test_reference_rules() {
    let dir = TempDir::new().unwrap();
    let dataset = load_dataset(
        &dir,
        "search_ref,manufacturer_ref\n\
         ABC123,MF-100\n\
         AB,MF\n\
         ABC-1,MF 100\n\
         abc1,MF@100\n",
    );
    let engine = DiagnosticEngine::new();

    // search_ref: "AB" (short), "ABC-1" (dash). Lower case letters are allowed.
    assert_eq!(engine.search_ref_issues(&dataset).unwrap(), 2);
    // manufacturer_ref: "MF" (short), "MF 100" (space), "MF@100" (symbol).
    assert_eq!(engine.manufacturer_ref_issues(&dataset).unwrap(), 3);
}

#[test]
fn test_null_like_values() {
    let dir = TempDir::new().unwrap();
    let dataset = load_dataset(&dir, "name,notes,width\nWIDGET,NaN,1\nGADGET,ok,\n");
    let engine = DiagnosticEngine::new();

    assert_eq!(
        engine
            .null_string_issues(&dataset, ["name", "notes"])
            .unwrap(),
        set(&["notes"])
    );
    assert_eq!(
        engine.null_numeric_issues(&dataset, ["width"]).unwrap(),
        set(&["width"])
    );
}

#[test]
fn test_uppercase_is_unicode_aware() {
    let dir = TempDir::new().unwrap();
    let dataset = load_dataset(&dir, "name,notes\nAÇÃO,ação\n");

    assert_eq!(
        DiagnosticEngine::new()
            .uppercase_issues(&dataset, ["name", "notes"])
            .unwrap(),
        set(&["notes"])
    );
}

#[test]
fn test_evaluate_single_family() {
    let dir = TempDir::new().unwrap();
    let dataset = load_dataset(&dir, MIXED);
    let engine = DiagnosticEngine::new();

    assert_eq!(
        engine.evaluate(&dataset, RuleFamily::Barcode).unwrap(),
        Finding::Rows(1)
    );
    assert_eq!(
        engine.evaluate(&dataset, RuleFamily::NullNumeric).unwrap(),
        Finding::Columns(set(&["gross_weight", "net_weight"]))
    );
}

#[test]
fn test_read_only_session_rejects_writes() {
    let dir = TempDir::new().unwrap();
    let dataset = load_dataset(&dir, MIXED);

    let session = dataset.session(AccessMode::ReadOnly).unwrap();
    let result = session.update(
        &smelter::store::Ident::new("name").unwrap(),
        &smelter::store::Expr::text("X"),
        &smelter::store::Expr::all(Vec::new()),
    );
    assert!(matches!(result, Err(SmelterError::Storage(_))));
}
