//! Example: Diagnose a catalog file with Smelter, without modifying it.
//!
//! Usage:
//!   cargo run --example diagnose -- <file_path>
//!
//! Example:
//!   cargo run --example diagnose -- catalog.csv

use std::env;
use std::path::Path;

use smelter::{LoadOptions, ProjectId, Smelter, SmelterConfig};

fn main() -> smelter::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: cargo run --example diagnose -- <file_path>");
        std::process::exit(1);
    }

    let path = Path::new(&args[1]);
    if !path.exists() {
        eprintln!("Error: File not found: {}", path.display());
        std::process::exit(1);
    }

    let data_dir = env::temp_dir().join("smelter-example");
    let smelter = Smelter::with_config(SmelterConfig::default().with_data_dir(&data_dir));
    let project = ProjectId::new("example")?;

    let separator = "=".repeat(60);
    println!("{}", separator);
    println!("Smelter Diagnosis: {}", path.display());
    println!("{}", separator);

    let summary = smelter.ingest_with(&project, path, &LoadOptions::default().keep_source())?;
    println!(
        "Loaded {} rows x {} columns ({})",
        summary.row_count,
        summary.columns.len(),
        summary.format
    );

    let columns = smelter.analyze_columns(&project)?;
    if !columns.missing.is_empty() {
        println!("Missing required columns: {}", columns.missing.join(", "));
    }
    if !columns.extra.is_empty() {
        println!("Unrecognized columns: {}", columns.extra.join(", "));
    }

    let report = smelter.diagnose(&project)?;
    println!();
    for family in report.affected_families() {
        println!("  {:18} {}", family.label(), report.finding(family).issue_count());
    }
    println!("Total issues: {}", report.total_issues());

    let duplicates = smelter.analyze_duplicates(&project);
    if let Ok(analysis) = duplicates {
        println!("Duplicate rows: {}", analysis.total_duplicates);
    }

    smelter.delete_project(&project)?;
    Ok(())
}
