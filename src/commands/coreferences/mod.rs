mod execute;
mod output;

use clap::Args;

use crate::commands::SourceArgs;

/// Show column names reused across tables and whether their types agree
///
/// Types are compared twice: as reported by the source (`warning`) and as
/// resolved by the backend (`error`). Error-tier columns are dropped by `generate`.
#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  schemagen coreferences                 # Analyze for the configured backend
  schemagen coreferences -b typedb       # Types as TypeQL would see them
  schemagen coreferences -o json         # Machine-readable report")]
pub struct CoreferencesCmd {
    /// Backend whose type vocabulary decides conflicts
    #[arg(short, long)]
    pub backend: Option<String>,

    /// Only list columns whose types disagree
    #[arg(long, default_value_t = false)]
    pub conflicts_only: bool,

    #[command(flatten)]
    pub source: SourceArgs,
}
