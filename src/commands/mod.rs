//! Command definitions and implementations.
//!
//! Each command is defined in its own module with:
//! - The command struct with clap attributes for CLI parsing
//! - An `execute` module producing a serializable result
//! - An `output` module formatting that result as a table

mod backends;
mod coreferences;
mod generate;
mod snapshot;

pub use backends::BackendsCmd;
pub use coreferences::CoreferencesCmd;
pub use generate::GenerateCmd;
pub use snapshot::SnapshotCmd;

use clap::{Args, Subcommand};
use log::warn;
use std::error::Error;
use std::path::Path;

use crate::adapter::{self, SchemaAdapter};
use crate::config::{CompileOptions, ConfigFile};
use crate::output::{OutputFormat, Outputable};

/// Trait for executing commands against a connected data source.
pub trait Execute {
    type Output: Outputable;

    fn execute(self, adapter: &dyn SchemaAdapter, options: &CompileOptions) -> Result<Self::Output, Box<dyn Error>>;
}

/// Schema and table selection shared by commands that read a data source.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Schema to introspect (defaults to the configured schema, then the source default)
    #[arg(short, long)]
    pub schema: Option<String>,

    /// Table to include; repeat for several (defaults to every table in the schema)
    #[arg(short, long = "table")]
    pub tables: Vec<String>,
}

impl SourceArgs {
    /// Overlay the flags on configured options.
    pub fn apply(&self, options: &mut CompileOptions) {
        if let Some(schema) = &self.schema {
            options.schema = Some(schema.clone());
        }
        if !self.tables.is_empty() {
            options.tables = self.tables.clone();
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render the schema with a backend
    Generate(GenerateCmd),

    /// Show column names reused across tables and whether their types agree
    Coreferences(CoreferencesCmd),

    /// Capture the raw schema metadata as a JSON snapshot
    Snapshot(SnapshotCmd),

    /// List the available backends
    Backends(BackendsCmd),

    /// Catch-all for unknown commands
    #[command(external_subcommand)]
    Unknown(Vec<String>),
}

impl Command {
    /// Execute the command and return formatted output
    ///
    /// The configuration file is only read by commands that reach the data source.
    pub fn run(self, config_path: &Path, format: OutputFormat) -> Result<String, Box<dyn Error>> {
        match self {
            Command::Generate(cmd) => run_connected(cmd, config_path, format),
            Command::Coreferences(cmd) => run_connected(cmd, config_path, format),
            Command::Snapshot(cmd) => run_connected(cmd, config_path, format),
            Command::Backends(cmd) => Ok(cmd.list().format(format)),
            Command::Unknown(args) => {
                Err(format!("Unknown command: {}", args.first().unwrap_or(&String::new())).into())
            }
        }
    }
}

/// Connect to the configured source, execute, and close the connection
/// whatever the outcome.
fn run_connected<C: Execute>(cmd: C, config_path: &Path, format: OutputFormat) -> Result<String, Box<dyn Error>> {
    let config = ConfigFile::load(config_path)?;
    let adapter = adapter::connect(&config.source)?;
    let result = cmd.execute(adapter.as_ref(), &config.compile);
    if let Err(err) = adapter.close() {
        warn!("Failed to close data source connection: {}", err);
    }
    Ok(result?.format(format))
}
