//! Output formatting for generate command results.

use super::execute::GenerateResult;
use crate::output::Outputable;

impl Outputable for GenerateResult {
    /// The rendered document itself, or a summary when it went to a file.
    fn to_table(&self) -> String {
        if let Some(document) = &self.document {
            return document.trim_end_matches('\n').to_string();
        }

        let mut lines = Vec::new();
        match &self.written_to {
            Some(path) => lines.push(format!(
                "Wrote {} output for schema '{}' to {}",
                self.backend,
                self.schema,
                path.display()
            )),
            None => lines.push(format!("Rendered {} output for schema '{}'", self.backend, self.schema)),
        }
        lines.push(format!("  {} entities, {} edges", self.entities, self.edges));

        if !self.diagnostics.is_empty() {
            lines.push(String::new());
            lines.push(format!("Diagnostics ({}):", self.diagnostics.len()));
            for diagnostic in &self.diagnostics {
                lines.push(format!("  {}", diagnostic));
            }
        }

        lines.join("\n")
    }
}
