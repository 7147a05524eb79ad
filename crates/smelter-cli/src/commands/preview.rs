//! Preview command - show one page of a project's rows.

use colored::Colorize;
use smelter::store::Record;

use super::{CommandResult, Context, cell_text, project_id};

/// Widest a cell may be printed before truncation.
const MAX_CELL_WIDTH: usize = 24;

pub fn run(ctx: &Context, project: &str, page: usize, limit: usize) -> CommandResult {
    let project = project_id(project)?;
    let preview = ctx.smelter.preview(&project, page, limit)?;

    if ctx.json {
        return ctx.print_json(&preview);
    }

    let pages = preview.total_rows.div_ceil(preview.page_size).max(1);
    println!(
        "{} {} (page {}/{}, {} rows total)",
        "Preview of".cyan().bold(),
        project.to_string().white(),
        preview.page,
        pages,
        preview.total_rows
    );
    println!();

    if preview.rows.is_empty() {
        println!("{}", "No rows on this page".dimmed());
        return Ok(());
    }

    print_table(&preview.columns, &preview.rows);
    Ok(())
}

/// Print records as an aligned text table.
pub fn print_table(columns: &[String], rows: &[Record]) {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| truncate(&row.get(c).map(cell_text).unwrap_or_default()))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(name.chars().count().min(MAX_CELL_WIDTH)))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(name, w)| format!("{:w$}", truncate(name), w = *w))
        .collect();
    println!("{}", header.join("  ").yellow().bold());

    for row in cells {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:w$}", cell, w = *w))
            .collect();
        println!("{}", line.join("  "));
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_CELL_WIDTH {
        text.to_string()
    } else {
        let kept: String = text.chars().take(MAX_CELL_WIDTH - 1).collect();
        format!("{}…", kept)
    }
}
