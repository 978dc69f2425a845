use std::error::Error;
use std::fs;
use std::path::PathBuf;

use log::info;
use serde::Serialize;

use super::GenerateCmd;
use crate::adapter::SchemaAdapter;
use crate::backends::BackendId;
use crate::commands::Execute;
use crate::compile::{compile, Diagnostic};
use crate::config::CompileOptions;

/// Result of the generate command execution
#[derive(Debug, Serialize)]
pub struct GenerateResult {
    pub backend: BackendId,
    pub schema: String,
    pub entities: usize,
    pub edges: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
    /// File the document was written to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub written_to: Option<PathBuf>,
    /// Rendered document, when not written to a file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
}

impl Execute for GenerateCmd {
    type Output = GenerateResult;

    fn execute(self, adapter: &dyn SchemaAdapter, options: &CompileOptions) -> Result<Self::Output, Box<dyn Error>> {
        let options = self.options(options);
        let compilation = compile(adapter, &options)?;

        let (written_to, document) = match &options.output {
            Some(path) => {
                fs::write(path, &compilation.output)
                    .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
                info!("Wrote {} output to {}", compilation.backend, path.display());
                (Some(path.clone()), None)
            }
            None => (None, Some(compilation.output)),
        };

        Ok(GenerateResult {
            backend: compilation.backend,
            schema: compilation.filtered.schema,
            entities: compilation.filtered.entities.len(),
            edges: compilation.filtered.edges.len(),
            diagnostics: compilation.diagnostics,
            written_to,
            document,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::SnapshotAdapter;
    use crate::commands::SourceArgs;
    use crate::test_utils::shop_snapshot;
    use rstest::{fixture, rstest};

    #[fixture]
    fn adapter() -> SnapshotAdapter {
        SnapshotAdapter::new(shop_snapshot())
    }

    fn cmd(backend: &str) -> GenerateCmd {
        GenerateCmd {
            backend: Some(backend.to_string()),
            source: SourceArgs::default(),
            out: None,
            strict_types: false,
        }
    }

    #[rstest]
    fn test_generate_to_stdout(adapter: SnapshotAdapter) {
        let result = cmd("cozo").execute(&adapter, &CompileOptions::default()).unwrap();
        assert_eq!(result.backend, BackendId::Cozo);
        assert_eq!(result.entities, 2);
        assert!(result.written_to.is_none());
        assert!(result.document.unwrap().contains(":create users {"));
    }

    #[rstest]
    fn test_generate_to_file(adapter: SnapshotAdapter) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.tql");
        let mut generate = cmd("typedb");
        generate.out = Some(path.clone());

        let result = generate.execute(&adapter, &CompileOptions::default()).unwrap();
        assert_eq!(result.written_to.as_deref(), Some(path.as_path()));
        assert!(result.document.is_none());
        assert!(fs::read_to_string(&path).unwrap().starts_with("define\n"));
    }

    #[rstest]
    fn test_table_allowlist_applies(adapter: SnapshotAdapter) {
        let mut generate = cmd("typescript");
        generate.source.tables = vec!["users".to_string()];
        let result = generate.execute(&adapter, &CompileOptions::default()).unwrap();
        assert_eq!(result.entities, 1);
        assert!(!result.document.unwrap().contains("interface Orders"));
    }

    #[rstest]
    fn test_strict_types_rejects_unmapped(adapter: SnapshotAdapter) {
        let snapshot = adapter.snapshot().clone().with_table(crate::ir::EntityDefinition::new(
            "places",
            vec![crate::ir::PropertyDefinition::new("shape", "geometry")],
        ));
        let adapter = SnapshotAdapter::new(snapshot);
        let mut generate = cmd("python");
        generate.strict_types = true;

        let err = generate.execute(&adapter, &CompileOptions::default()).unwrap_err();
        assert!(err.to_string().contains("geometry"));
    }

    #[rstest]
    fn test_unknown_backend(adapter: SnapshotAdapter) {
        let err = cmd("cobol").execute(&adapter, &CompileOptions::default()).unwrap_err();
        assert!(err.to_string().contains("typescript"));
    }
}
