//! Duplicates command - find and remove repeated search_ref/brand rows.

use colored::Colorize;

use super::{CommandResult, Context, project_id};

pub fn run(ctx: &Context, project: &str, remove: bool) -> CommandResult {
    let project = project_id(project)?;

    if remove {
        let result = ctx.smelter.remove_duplicates(&project)?;
        if ctx.json {
            return ctx.print_json(&result);
        }
        println!(
            "{} {} duplicate rows",
            "Removed".green().bold(),
            result.rows_affected.to_string().white().bold()
        );
        return Ok(());
    }

    let analysis = ctx.smelter.analyze_duplicates(&project)?;
    if ctx.json {
        return ctx.print_json(&analysis);
    }

    if analysis.duplicates.is_empty() {
        println!("{}", "No duplicates found".green());
        return Ok(());
    }

    println!(
        "Found {} groups, {} rows to remove",
        analysis.duplicate_groups.to_string().white().bold(),
        analysis.total_duplicates.to_string().yellow()
    );
    println!();
    for group in &analysis.duplicates {
        println!(
            "  {:20} {:20} {}",
            group.search_ref.white(),
            group.brand,
            format!("×{}", group.count).yellow()
        );
    }

    println!();
    println!(
        "Run {} to keep only the first row of each group",
        format!("smelter duplicates {} --remove", project).cyan().bold()
    );
    Ok(())
}
