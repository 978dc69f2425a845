use std::error::Error;

use super::SnapshotCmd;
use crate::adapter::{SchemaAdapter, SchemaSnapshot};
use crate::commands::Execute;
use crate::config::CompileOptions;
use crate::ir::IrBuilder;

impl Execute for SnapshotCmd {
    type Output = SchemaSnapshot;

    fn execute(self, adapter: &dyn SchemaAdapter, options: &CompileOptions) -> Result<Self::Output, Box<dyn Error>> {
        let mut options = options.clone();
        self.source.apply(&mut options);
        Ok(IrBuilder::new(adapter, &options).fetch()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::SnapshotAdapter;
    use crate::commands::SourceArgs;
    use crate::ir::merge;
    use crate::test_utils::shop_snapshot;
    use rstest::rstest;

    #[rstest]
    fn test_snapshot_round_trips_through_adapter() {
        let adapter = SnapshotAdapter::new(shop_snapshot());
        let captured = SnapshotCmd { source: SourceArgs::default() }
            .execute(&adapter, &CompileOptions::default())
            .unwrap();

        let options = CompileOptions::default();
        let direct = merge(shop_snapshot(), &options).unwrap();
        let replayed = merge(captured, &options).unwrap();
        assert_eq!(direct.entities, replayed.entities);
        assert_eq!(direct.foreign_keys, replayed.foreign_keys);
        assert_eq!(direct.table_comments, replayed.table_comments);
    }

    #[rstest]
    fn test_snapshot_respects_table_allowlist() {
        let adapter = SnapshotAdapter::new(shop_snapshot());
        let captured = SnapshotCmd {
            source: SourceArgs {
                schema: None,
                tables: vec!["orders".to_string()],
            },
        }
        .execute(&adapter, &CompileOptions::default())
        .unwrap();
        assert_eq!(captured.tables.len(), 1);
        assert_eq!(captured.tables[0].name, "orders");
    }
}
