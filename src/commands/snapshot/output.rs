//! Output formatting for snapshot command results.

use crate::adapter::SchemaSnapshot;
use crate::output::Outputable;

impl Outputable for SchemaSnapshot {
    /// Snapshots are meant to be read back, so the table form is the JSON file.
    fn to_table(&self) -> String {
        self.to_json().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::shop_snapshot;
    use rstest::{fixture, rstest};

    #[fixture]
    fn snapshot() -> SchemaSnapshot {
        shop_snapshot()
    }

    #[rstest]
    fn test_table_output_parses_back(snapshot: SchemaSnapshot) {
        let parsed: SchemaSnapshot = serde_json::from_str(&snapshot.to_table()).unwrap();
        assert_eq!(parsed, snapshot);
    }

    crate::output_json_test! {
        test_name: test_format_json,
        fixture: snapshot,
        fixture_type: SchemaSnapshot,
        assertions: {
            "schema": "public",
            "data_source": "postgres",
        },
    }
}
