//! Columns and rename commands - check and fix column names.

use colored::Colorize;

use super::{CommandResult, Context, project_id};

pub fn run(ctx: &Context, project: &str) -> CommandResult {
    let project = project_id(project)?;
    let analysis = ctx.smelter.analyze_columns(&project)?;

    if ctx.json {
        return ctx.print_json(&analysis);
    }

    println!(
        "{} {}",
        "Columns of".cyan().bold(),
        project.to_string().white()
    );
    println!();

    println!("{}", "Present:".yellow().bold());
    for name in &analysis.present {
        println!("  {} {}", "✓".green(), name);
    }
    if !analysis.missing.is_empty() {
        println!("{}", "Missing (required):".yellow().bold());
        for name in &analysis.missing {
            println!("  {} {}", "✗".red(), name);
        }
    }
    if !analysis.extra.is_empty() {
        println!("{}", "Unrecognized:".yellow().bold());
        for name in &analysis.extra {
            println!("  {} {}", "?".blue(), name);
        }
    }
    if ctx.verbose {
        println!();
        println!("Optional columns: {}", analysis.optional.join(", ").dimmed());
    }

    println!();
    if analysis.is_complete() {
        println!("{}", "All required columns are present".green());
    } else if !analysis.extra.is_empty() {
        println!(
            "Run {} to map an unrecognized column",
            format!("smelter rename {} <OLD> <NEW>", project).cyan().bold()
        );
    }

    Ok(())
}

pub fn rename(ctx: &Context, project: &str, old: &str, new: &str) -> CommandResult {
    let project = project_id(project)?;
    ctx.smelter.rename_column(&project, old, new)?;

    if ctx.json {
        return ctx.print_json(&serde_json::json!({ "old": old, "new": new }));
    }

    println!(
        "{} {} → {}",
        "Renamed".green().bold(),
        old.white(),
        new.white().bold()
    );
    Ok(())
}
