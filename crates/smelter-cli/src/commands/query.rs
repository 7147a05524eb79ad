//! Query command - run ad-hoc SQL against a project.

use colored::Colorize;
use smelter::QueryStatus;
use smelter::store::QueryKind;

use super::preview::print_table;
use super::{CommandResult, Context, project_id};

pub fn run(ctx: &Context, project: &str, sql: &str, read_only: bool) -> CommandResult {
    let project = project_id(project)?;

    if read_only && QueryKind::classify(sql) != QueryKind::Rows {
        return Err("Only select, show and describe are allowed with --read-only".into());
    }

    let outcome = ctx.smelter.run_query(&project, sql);

    if ctx.json {
        ctx.print_json(&outcome)?;
    } else if outcome.status == QueryStatus::Error {
        println!(
            "{} {}",
            "Query failed:".red().bold(),
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    } else if let Some(rows) = &outcome.data {
        let columns: Vec<String> = rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default();
        if rows.is_empty() {
            println!("{}", "No rows".dimmed());
        } else {
            print_table(&columns, rows);
            println!();
        }
        println!("{} rows", rows.len().to_string().white().bold());
    } else {
        println!("{}", "Statement executed".green().bold());
    }

    if outcome.is_success() {
        Ok(())
    } else {
        Err("query did not succeed".into())
    }
}
