//! Smelter CLI - catalog data diagnosis and remediation.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use commands::Context;
use smelter::SmelterConfig;
use smelter::store::TableName;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = context(&cli).and_then(|ctx| match cli.command {
        Commands::Load {
            file,
            project,
            keep_source,
        } => commands::load::run(&ctx, file, project, keep_source),

        Commands::Preview {
            project,
            page,
            limit,
        } => commands::preview::run(&ctx, &project, page, limit),

        Commands::Query {
            project,
            sql,
            read_only,
        } => commands::query::run(&ctx, &project, &sql, read_only),

        Commands::Columns { project } => commands::columns::run(&ctx, &project),

        Commands::Rename { project, old, new } => {
            commands::columns::rename(&ctx, &project, &old, &new)
        }

        Commands::Diagnose { project } => commands::diagnose::run(&ctx, &project),

        Commands::Fixes => commands::fix::list(&ctx),

        Commands::Fix {
            project,
            remediation,
            columns,
        } => commands::fix::run(&ctx, &project, remediation, &columns),

        Commands::Duplicates { project, remove } => {
            commands::duplicates::run(&ctx, &project, remove)
        }

        Commands::Export { project, output } => {
            commands::export::run(&ctx, &project, output.as_deref())
        }

        Commands::Delete { project } => commands::export::delete(&ctx, &project),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr, filtered by `RUST_LOG` or the verbosity flag.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn context(cli: &Cli) -> commands::CommandResult<Context> {
    let mut config = SmelterConfig::default()
        .with_data_dir(&cli.data_dir)
        .with_table(TableName::new(cli.table.as_str())?);
    if let Some(delimiter) = cli.delimiter {
        config = config.with_delimiter(delimiter);
    }

    tracing::debug!(
        data_dir = %config.data_dir.display(),
        table = %config.table,
        "configuration resolved"
    );
    Ok(Context::new(config, cli.json, cli.verbose))
}
