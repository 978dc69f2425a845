//! Output formatting for coreferences command results.

use super::execute::CoreferenceReport;
use crate::output::{align_columns, Outputable};

impl CoreferenceReport {
    fn tier(&self, column: &str) -> Option<&'static str> {
        if self.error.contains_key(column) {
            Some("error")
        } else if self.warning.contains_key(column) {
            Some("warning")
        } else {
            None
        }
    }
}

impl Outputable for CoreferenceReport {
    fn to_table(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Coreferences: {} ({})", self.schema, self.backend));
        lines.push(String::new());

        if self.all.is_empty() {
            lines.push("No column names are shared between tables.".to_string());
            return lines.join("\n");
        }

        lines.push(format!(
            "Shared columns ({}), {} warning, {} error:",
            self.all.len(),
            self.warning.len(),
            self.error.len()
        ));

        for (column, entries) in &self.all {
            lines.push(String::new());
            match self.tier(column) {
                Some(tier) => lines.push(format!("  {} [{}]", column, tier)),
                None => lines.push(format!("  {}", column)),
            }
            let rows: Vec<Vec<String>> = entries
                .iter()
                .map(|e| {
                    vec![
                        e.table_name.clone(),
                        e.source_type.clone(),
                        e.resolved_type.clone(),
                    ]
                })
                .collect();
            for line in align_columns(&["TABLE", "SOURCE", "RESOLVED"], &rows) {
                lines.push(format!("    {}", line));
            }
        }

        lines.join("\n")
    }
}
