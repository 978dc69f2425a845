mod execute;
mod output;

use clap::Args;

/// List the available backends
#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  schemagen backends            # Identifiers accepted by --backend
  schemagen backends -o json")]
pub struct BackendsCmd {}
