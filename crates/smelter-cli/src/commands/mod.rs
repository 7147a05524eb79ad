//! CLI command implementations.

pub mod columns;
pub mod diagnose;
pub mod duplicates;
pub mod export;
pub mod fix;
pub mod load;
pub mod preview;
pub mod query;

use serde::Serialize;
use smelter::{ProjectId, Smelter, SmelterConfig};

pub type CommandResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Settings shared by every command.
pub struct Context {
    pub smelter: Smelter,
    pub json: bool,
    pub verbose: bool,
}

impl Context {
    pub fn new(config: SmelterConfig, json: bool, verbose: bool) -> Self {
        Self {
            smelter: Smelter::with_config(config),
            json,
            verbose,
        }
    }

    /// Print `value` as pretty JSON on stdout.
    pub fn print_json<T: Serialize>(&self, value: &T) -> CommandResult {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

pub fn project_id(id: &str) -> CommandResult<ProjectId> {
    Ok(ProjectId::new(id)?)
}

/// Render a JSON cell for a terminal table.
pub fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
