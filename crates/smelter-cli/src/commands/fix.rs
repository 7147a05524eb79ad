//! Fix commands - list and apply remediations.

use colored::Colorize;
use smelter::Remediation;

use super::{CommandResult, Context, project_id};

pub fn list(ctx: &Context) -> CommandResult {
    if ctx.json {
        let fixes: Vec<serde_json::Value> = Remediation::ALL
            .iter()
            .map(|r| {
                serde_json::json!({
                    "name": r.name(),
                    "description": r.description(),
                    "columns": r.default_columns(),
                    "accepts_columns": r.accepts_columns(),
                })
            })
            .collect();
        return ctx.print_json(&fixes);
    }

    println!("{}", "Available fixes:".yellow().bold());
    for fix in Remediation::ALL {
        println!("  {:18} {}", fix.name().cyan(), fix.description());
        if ctx.verbose {
            println!("  {:18} {}", "", fix.default_columns().join(", ").dimmed());
        }
    }
    Ok(())
}

pub fn run(
    ctx: &Context,
    project: &str,
    remediation: Remediation,
    columns: &[String],
) -> CommandResult {
    let project = project_id(project)?;

    let result = if columns.is_empty() {
        ctx.smelter.remediate(&project, remediation)?
    } else {
        ctx.smelter.remediate_columns(&project, remediation, columns)?
    };

    if ctx.json {
        return ctx.print_json(&result);
    }

    if result.is_noop() {
        println!(
            "{} {}: nothing to change",
            "Applied".green().bold(),
            remediation.to_string().white()
        );
        return Ok(());
    }

    println!(
        "{} {}: {} rows changed",
        "Applied".green().bold(),
        remediation.to_string().white(),
        result.rows_affected.to_string().white().bold()
    );
    if !result.columns_affected.is_empty() {
        println!("  Columns: {}", result.columns_affected.join(", "));
    }
    Ok(())
}
