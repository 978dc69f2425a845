//! Output formatting for backends command results.

use super::execute::BackendList;
use crate::output::{align_columns, Outputable};

impl Outputable for BackendList {
    fn to_table(&self) -> String {
        let mut lines = vec![format!("Backends ({}):", self.backends.len()), String::new()];
        let rows: Vec<Vec<String>> = self
            .backends
            .iter()
            .map(|b| vec![b.name.to_string(), b.description.to_string()])
            .collect();
        lines.extend(align_columns(&["NAME", "OUTPUT"], &rows).into_iter().map(|l| format!("  {}", l)));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::super::BackendsCmd;
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn list() -> BackendList {
        BackendsCmd {}.list()
    }

    crate::output_table_contains_test! {
        test_name: test_to_table,
        fixture: list,
        fixture_type: BackendList,
        contains: [
            "Backends (8):",
            "  NAME        OUTPUT",
            "  typescript  TypeScript interfaces and string-union enums",
            "  toon        Filtered schema with resolved types (toon)",
        ],
    }

    #[rstest]
    fn test_format_json(list: BackendList) {
        use crate::output::OutputFormat;
        let parsed: serde_json::Value = serde_json::from_str(&list.format(OutputFormat::Json)).unwrap();
        assert_eq!(parsed["backends"][1]["name"], "typedb");
        assert_eq!(parsed["backends"].as_array().unwrap().len(), 8);
    }
}
