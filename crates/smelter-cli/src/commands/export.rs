//! Export and delete commands.

use std::path::Path;

use colored::Colorize;

use super::{CommandResult, Context, project_id};

pub fn run(ctx: &Context, project: &str, output: Option<&Path>) -> CommandResult {
    let project = project_id(project)?;
    let path = ctx.smelter.export(&project, output)?;

    if ctx.json {
        return ctx.print_json(&serde_json::json!({ "path": path }));
    }

    println!(
        "{} {}",
        "Exported to".green().bold(),
        path.display().to_string().white()
    );
    Ok(())
}

pub fn delete(ctx: &Context, project: &str) -> CommandResult {
    let project = project_id(project)?;
    let removed = ctx.smelter.delete_project(&project)?;

    if ctx.json {
        return ctx.print_json(&serde_json::json!({ "deleted": removed }));
    }

    if removed {
        println!(
            "{} {}",
            "Deleted project".green().bold(),
            project.to_string().white()
        );
    } else {
        println!("Nothing to delete for {}", project.to_string().white());
    }
    Ok(())
}
