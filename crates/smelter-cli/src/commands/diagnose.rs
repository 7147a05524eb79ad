//! Diagnose command - report data quality issues.

use colored::Colorize;
use smelter::{Finding, Remediation, RuleFamily};

use super::{CommandResult, Context, project_id};

pub fn run(ctx: &Context, project: &str) -> CommandResult {
    let project = project_id(project)?;
    let report = ctx.smelter.diagnose(&project)?;

    if ctx.json {
        return ctx.print_json(&report);
    }

    println!(
        "{} {}",
        "Diagnosis of".cyan().bold(),
        project.to_string().white()
    );
    println!();

    for family in RuleFamily::ALL {
        let finding = report.finding(family);
        let count = finding.issue_count();
        let marker = if count == 0 { "✓".green() } else { "✗".red() };

        let detail = match &finding {
            Finding::Columns(columns) if columns.is_empty() => "no columns".dimmed().to_string(),
            Finding::Columns(columns) => columns
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
                .yellow()
                .to_string(),
            Finding::Rows(0) => "no rows".dimmed().to_string(),
            Finding::Rows(n) => format!("{} rows", n).yellow().to_string(),
        };
        println!("  {} {:18} {}", marker, family.label(), detail);
    }

    println!();
    if report.is_clean() {
        println!("{}", "No issues found - data looks clean!".green());
        return Ok(());
    }

    println!(
        "Found {} issues",
        report.total_issues().to_string().white().bold()
    );
    let fixes: Vec<Remediation> = Remediation::ALL
        .into_iter()
        .filter(|r| report.finding(r.family()).issue_count() > 0)
        .collect();
    if !fixes.is_empty() {
        println!("Suggested fixes:");
        for fix in fixes {
            println!(
                "  {}",
                format!("smelter fix {} {}", project, fix).cyan().bold()
            );
        }
    }

    Ok(())
}
