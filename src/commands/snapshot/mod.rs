mod cli_tests;
mod execute;
mod output;

use clap::Args;

use crate::commands::SourceArgs;

/// Capture the raw schema metadata as a JSON snapshot
///
/// The snapshot can be compiled later without a connection by pointing a
/// `snapshot` source at it.
#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  schemagen snapshot > shop.json           # Every table of the default schema
  schemagen snapshot -s billing -t invoices")]
pub struct SnapshotCmd {
    #[command(flatten)]
    pub source: SourceArgs,
}
