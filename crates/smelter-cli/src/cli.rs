//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use smelter::Remediation;
use std::path::PathBuf;

/// Smelter: diagnose and fix product catalog data
#[derive(Parser)]
#[command(name = "smelter")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding one store file per project
    #[arg(long, global = true, env = "SMELTER_DATA_DIR", default_value = "temp_data")]
    pub data_dir: PathBuf,

    /// Table the data is loaded into
    #[arg(long, global = true, default_value = "raw_data")]
    pub table: String,

    /// Delimiter for loading files: a single character or "tab" (default: auto-detect)
    #[arg(long, global = true, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a delimited file into a project, replacing its data
    Load {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Project to load into (default: a freshly generated id)
        #[arg(short, long)]
        project: Option<String>,

        /// Keep the source file instead of deleting it once loaded
        #[arg(long)]
        keep_source: bool,
    },

    /// Show one page of rows
    Preview {
        #[arg(value_name = "PROJECT")]
        project: String,

        /// Page number, starting at 1
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Rows per page
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Run ad-hoc SQL against a project
    Query {
        #[arg(value_name = "PROJECT")]
        project: String,

        /// SQL text; `show tables` and `describe <table>` are also accepted
        #[arg(value_name = "SQL")]
        sql: String,

        /// Refuse anything that does not return rows
        #[arg(long)]
        read_only: bool,
    },

    /// Compare the project's columns with the expected catalog columns
    Columns {
        #[arg(value_name = "PROJECT")]
        project: String,
    },

    /// Rename a column to a recognized catalog column name
    Rename {
        #[arg(value_name = "PROJECT")]
        project: String,

        #[arg(value_name = "OLD")]
        old: String,

        #[arg(value_name = "NEW")]
        new: String,
    },

    /// Report data quality issues
    Diagnose {
        #[arg(value_name = "PROJECT")]
        project: String,
    },

    /// List the available fixes
    Fixes,

    /// Apply a fix in place
    Fix {
        #[arg(value_name = "PROJECT")]
        project: String,

        /// Fix to apply (see `smelter fixes`)
        #[arg(value_name = "FIX")]
        remediation: Remediation,

        /// Restrict the fix to these columns (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        columns: Vec<String>,
    },

    /// Find rows sharing a search_ref and brand
    Duplicates {
        #[arg(value_name = "PROJECT")]
        project: String,

        /// Delete all but the first row of each group
        #[arg(long)]
        remove: bool,
    },

    /// Export a project to a delimited file
    Export {
        #[arg(value_name = "PROJECT")]
        project: String,

        /// Output path (default: <data-dir>/<project>_export.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete a project's store and default export
    Delete {
        #[arg(value_name = "PROJECT")]
        project: String,
    },
}

/// Parse a delimiter argument.
fn parse_delimiter(s: &str) -> Result<u8, String> {
    match s {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() && c != '"' && c != '\n' => Ok(c as u8),
                _ => Err(format!(
                    "Invalid delimiter: {:?}. Use a single ASCII character or \"tab\".",
                    s
                )),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert!(parse_delimiter(";;").is_err());
        assert!(parse_delimiter("\"").is_err());
        assert!(parse_delimiter("é").is_err());
    }

    #[test]
    fn test_fix_arguments() {
        let cli = Cli::try_parse_from([
            "smelter",
            "fix",
            "catalog",
            "null_strings",
            "--columns",
            "name,brand",
        ])
        .unwrap();

        match cli.command {
            Commands::Fix {
                remediation,
                columns,
                ..
            } => {
                assert_eq!(remediation, Remediation::NullStrings);
                assert_eq!(columns, vec!["name", "brand"]);
            }
            _ => panic!("expected fix"),
        }
    }

    #[test]
    fn test_load_deletes_source_by_default() {
        let cli = Cli::try_parse_from(["smelter", "load", "upload.csv"]).unwrap();
        assert!(matches!(cli.command, Commands::Load { keep_source: false, .. }));

        let cli = Cli::try_parse_from(["smelter", "load", "upload.csv", "--keep-source"]).unwrap();
        assert!(matches!(cli.command, Commands::Load { keep_source: true, .. }));
    }

    #[test]
    fn test_unknown_fix_rejected() {
        assert!(Cli::try_parse_from(["smelter", "fix", "catalog", "sparkle"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "smelter",
            "diagnose",
            "catalog",
            "--json",
            "--data-dir",
            "/tmp/stores",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.data_dir, PathBuf::from("/tmp/stores"));
    }
}
