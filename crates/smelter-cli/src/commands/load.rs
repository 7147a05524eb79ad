//! Load command - ingest a delimited file into a project.

use std::path::PathBuf;

use colored::Colorize;
use smelter::{LoadOptions, ProjectId};

use super::{CommandResult, Context, project_id};

pub fn run(
    ctx: &Context,
    file: PathBuf,
    project: Option<String>,
    keep_source: bool,
) -> CommandResult {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    let project = match project {
        Some(id) => project_id(&id)?,
        None => ProjectId::generate(),
    };

    let options = LoadOptions {
        delimiter: ctx.smelter.config().delimiter,
        delete_source: !keep_source,
        ..LoadOptions::default()
    };
    let summary = ctx.smelter.ingest_with(&project, &file, &options)?;

    if ctx.json {
        return ctx.print_json(&serde_json::json!({
            "project": project,
            "summary": summary,
        }));
    }

    println!(
        "{} {} {} {}",
        "Loaded".green().bold(),
        summary.file.white(),
        "into project".green().bold(),
        project.to_string().white().bold()
    );
    println!(
        "  {} rows, {} columns ({})",
        summary.row_count.to_string().white().bold(),
        summary.columns.len().to_string().white().bold(),
        summary.format
    );
    if ctx.verbose {
        println!("  Hash: {}", summary.hash);
        println!("  Size: {} bytes", summary.size_bytes);
        println!("  Columns: {}", summary.columns.join(", "));
    }
    if summary.source_deleted {
        println!("  {}", "Source file removed".dimmed());
    }

    println!();
    println!(
        "Run {} to check data quality",
        format!("smelter diagnose {}", project).cyan().bold()
    );

    Ok(())
}
