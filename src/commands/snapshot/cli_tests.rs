//! CLI parsing tests for snapshot command.

#[cfg(test)]
mod tests {
    use crate::cli::Args;
    use clap::Parser;
    use rstest::rstest;

    #[rstest]
    fn test_snapshot_defaults() {
        let args = Args::try_parse_from(["schemagen", "snapshot"]).unwrap();
        match args.command {
            crate::commands::Command::Snapshot(cmd) => {
                assert!(cmd.source.schema.is_none());
                assert!(cmd.source.tables.is_empty());
            }
            _ => panic!("Expected Snapshot command"),
        }
    }

    #[rstest]
    fn test_snapshot_with_schema_and_tables() {
        let args = Args::try_parse_from(["schemagen", "snapshot", "--schema", "billing", "-t", "invoices"]).unwrap();
        match args.command {
            crate::commands::Command::Snapshot(cmd) => {
                assert_eq!(cmd.source.schema.as_deref(), Some("billing"));
                assert_eq!(cmd.source.tables, vec!["invoices"]);
            }
            _ => panic!("Expected Snapshot command"),
        }
    }
}
