use std::error::Error;

use serde::Serialize;

use super::CoreferencesCmd;
use crate::adapter::SchemaAdapter;
use crate::backends::BackendId;
use crate::commands::Execute;
use crate::compile::analyze;
use crate::config::CompileOptions;
use crate::coreference::CoreferenceMap;
use crate::ir::IrBuilder;

/// Result of the coreferences command execution
#[derive(Debug, Serialize)]
pub struct CoreferenceReport {
    pub backend: BackendId,
    pub schema: String,
    pub all: CoreferenceMap,
    pub warning: CoreferenceMap,
    pub error: CoreferenceMap,
}

impl Execute for CoreferencesCmd {
    type Output = CoreferenceReport;

    fn execute(self, adapter: &dyn SchemaAdapter, options: &CompileOptions) -> Result<Self::Output, Box<dyn Error>> {
        let mut options = options.clone();
        self.source.apply(&mut options);
        let backend: BackendId = self.backend.as_deref().unwrap_or(&options.backend).parse()?;

        let ctx = IrBuilder::new(adapter, &options).build()?;
        let coreferences = analyze(&ctx, backend)?;

        let mut all = coreferences.all;
        if self.conflicts_only {
            all.retain(|name, _| coreferences.warning.contains_key(name) || coreferences.error.contains_key(name));
        }

        Ok(CoreferenceReport {
            backend,
            schema: ctx.schema,
            all,
            warning: coreferences.warning,
            error: coreferences.error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{SchemaSnapshot, SnapshotAdapter};
    use crate::commands::SourceArgs;
    use crate::ir::{DataSource, EntityDefinition, PropertyDefinition};
    use rstest::{fixture, rstest};

    #[fixture]
    fn adapter() -> SnapshotAdapter {
        SnapshotAdapter::new(
            SchemaSnapshot::new(DataSource::Postgres, "public")
                .with_table(EntityDefinition::new(
                    "users",
                    vec![PropertyDefinition::new("id", "int4"), PropertyDefinition::new("status", "user_status")],
                ))
                .with_table(EntityDefinition::new(
                    "accounts",
                    vec![PropertyDefinition::new("id", "varchar"), PropertyDefinition::new("status", "varchar")],
                ))
                .with_table(EntityDefinition::new(
                    "teams",
                    vec![PropertyDefinition::new("name", "text"), PropertyDefinition::new("id", "int4")],
                ))
                .with_table(EntityDefinition::new("members", vec![PropertyDefinition::new("name", "text")]))
                .with_enum(crate::ir::EnumDefinition::new("user_status", &["active", "banned"])),
        )
    }

    fn cmd(backend: &str, conflicts_only: bool) -> CoreferencesCmd {
        CoreferencesCmd {
            backend: Some(backend.to_string()),
            conflicts_only,
            source: SourceArgs::default(),
        }
    }

    #[rstest]
    fn test_report_tiers(adapter: SnapshotAdapter) {
        let report = cmd("typedb", false).execute(&adapter, &CompileOptions::default()).unwrap();
        assert_eq!(report.backend, BackendId::TypeDb);
        assert_eq!(report.all.keys().collect::<Vec<_>>(), vec!["id", "name", "status"]);
        assert!(report.warning.contains_key("status"));
        assert!(!report.error.contains_key("status"));
        assert!(report.error.contains_key("id"));
        assert!(!report.warning.contains_key("name"));
    }

    #[rstest]
    fn test_conflicts_only(adapter: SnapshotAdapter) {
        let report = cmd("typedb", true).execute(&adapter, &CompileOptions::default()).unwrap();
        assert_eq!(report.all.keys().collect::<Vec<_>>(), vec!["id", "status"]);
    }

    #[rstest]
    fn test_backend_defaults_to_configured(adapter: SnapshotAdapter) {
        let command = CoreferencesCmd {
            backend: None,
            conflicts_only: false,
            source: SourceArgs::default(),
        };
        let options = CompileOptions {
            backend: "julia".to_string(),
            ..Default::default()
        };
        let report = command.execute(&adapter, &options).unwrap();
        assert_eq!(report.backend, BackendId::Julia);
    }
}
