mod execute;
mod output;

use clap::Args;
use std::path::PathBuf;

use crate::commands::SourceArgs;
use crate::config::CompileOptions;

/// Render the schema with a backend
#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  schemagen generate                             # Configured backend, every table
  schemagen generate -b typedb --out schema.tql  # TypeQL schema written to a file
  schemagen generate -b python -t users -t orders
  schemagen generate -b julia --strict-types     # Fail on unmapped column types")]
pub struct GenerateCmd {
    /// Backend identifier (see `schemagen backends`)
    #[arg(short, long)]
    pub backend: Option<String>,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Write the rendered document to this file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Fail on column types with no mapping instead of emitting the fallback type
    #[arg(long, default_value_t = false)]
    pub strict_types: bool,
}

impl GenerateCmd {
    /// Configured options with the command line flags applied.
    pub fn options(&self, configured: &CompileOptions) -> CompileOptions {
        let mut options = configured.clone();
        self.source.apply(&mut options);
        if let Some(backend) = &self.backend {
            options.backend = backend.clone();
        }
        if let Some(out) = &self.out {
            options.output = Some(out.clone());
        }
        if self.strict_types {
            options.throw_on_missing_type = true;
        }
        options
    }
}
