//! Pipeline orchestration.
//!
//! ```text
//! adapter -> IrBuilder -> BuildContext -> coreference::analyze
//!                                      -> postprocess -> backend render
//! ```
//!
//! The backend identifier is validated before the adapter is touched, so an
//! unknown backend never costs a round trip to the data source.

use std::fmt;

use log::{debug, info};
use serde::Serialize;

use crate::adapter::SchemaAdapter;
use crate::backends::{self, BackendId};
use crate::config::CompileOptions;
use crate::coreference::{self, Coreferences};
use crate::error::CompileError;
use crate::ir::{BuildContext, IrBuilder};
use crate::postprocess::{self, Postprocessed};
use crate::types::{TypeOrigin, TypeResolver};

/// A non-fatal finding reported alongside the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A column name resolves to different types across tables.
    CoreferenceConflict {
        column: String,
        tables: Vec<String>,
        /// Whether the column was removed from the output
        dropped: bool,
    },
    EnumCollision {
        name: String,
        first: Vec<String>,
        second: Vec<String>,
    },
    /// A raw type with no mapping that was emitted as the fallback type.
    TypeFallback {
        entity: String,
        column: String,
        raw_type: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::CoreferenceConflict { column, tables, dropped } => {
                let action = if *dropped { "dropped" } else { "kept" };
                write!(f, "conflicting types for '{}' in {} ({})", column, tables.join(", "), action)
            }
            Diagnostic::EnumCollision { name, first, second } => write!(
                f,
                "enum '{}' defined as [{}] and [{}]",
                name,
                first.join(", "),
                second.join(", ")
            ),
            Diagnostic::TypeFallback { entity, column, raw_type } => {
                write!(f, "no mapping for '{}' on {}.{}", raw_type, entity, column)
            }
        }
    }
}

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub backend: BackendId,
    /// IR as built from the source
    pub context: BuildContext,
    /// IR after filtering, as rendered
    pub filtered: BuildContext,
    pub coreferences: Coreferences,
    pub diagnostics: Vec<Diagnostic>,
    pub output: String,
}

/// Build the IR from an adapter and render it with the configured backend.
pub fn compile(adapter: &dyn SchemaAdapter, options: &CompileOptions) -> Result<Compilation, CompileError> {
    let backend: BackendId = options.backend.parse()?;
    let context = IrBuilder::new(adapter, options).build()?;
    compile_context(context, backend)
}

/// Coreference analysis of an IR under one backend.
pub fn analyze(ctx: &BuildContext, backend: BackendId) -> Result<Coreferences, CompileError> {
    let resolver = TypeResolver::for_context(ctx, backend);
    coreference::analyze(ctx, &resolver)
}

/// Analyze, filter and render an already built IR.
pub fn compile_context(context: BuildContext, backend: BackendId) -> Result<Compilation, CompileError> {
    let coreferences = analyze(&context, backend)?;
    debug!(
        "Coreferences for {}: {} shared, {} warning, {} error",
        backend,
        coreferences.all.len(),
        coreferences.warning.len(),
        coreferences.error.len()
    );

    let Postprocessed {
        context: filtered,
        dropped_properties,
        enum_collisions,
        ..
    } = postprocess::postprocess(&context, &coreferences)?;

    let output = backends::render(backend, &filtered, &coreferences)?;

    let mut diagnostics = Vec::new();
    for (column, entries) in &coreferences.error {
        let mut tables: Vec<String> = entries.iter().map(|e| e.table_name.clone()).collect();
        tables.dedup();
        diagnostics.push(Diagnostic::CoreferenceConflict {
            column: column.clone(),
            tables,
            dropped: dropped_properties.iter().any(|d| &d.column == column),
        });
    }
    diagnostics.extend(enum_collisions.into_iter().map(|c| Diagnostic::EnumCollision {
        name: c.name,
        first: c.first,
        second: c.second,
    }));
    let resolver = TypeResolver::for_context(&filtered, backend);
    for (owner, property) in filtered.flattened_properties() {
        let fallback = resolver
            .resolve(&property.raw_type, Default::default())
            .is_some_and(|r| r.origin == TypeOrigin::Fallback);
        if fallback {
            diagnostics.push(Diagnostic::TypeFallback {
                entity: owner.to_string(),
                column: property.name.clone(),
                raw_type: property.raw_type.clone(),
            });
        }
    }

    info!(
        "Rendered {} entities and {} edges from schema '{}' with {} ({} diagnostics)",
        filtered.entities.len(),
        filtered.edges.len(),
        filtered.schema,
        backend,
        diagnostics.len()
    );

    Ok(Compilation {
        backend,
        context,
        filtered,
        coreferences,
        diagnostics,
        output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::SnapshotAdapter;
    use crate::ir::{DataSource, EdgeDefinition, EntityDefinition, EnumDefinition, PropertyDefinition};
    use crate::test_utils::{context_with, shop_snapshot};
    use rstest::rstest;

    fn options(backend: &str) -> CompileOptions {
        CompileOptions {
            backend: backend.to_string(),
            ..Default::default()
        }
    }

    #[rstest]
    fn test_invalid_backend_fails_before_fetching() {
        let adapter = SnapshotAdapter::new(shop_snapshot()).with_failing_table("users");
        let err = compile(&adapter, &options("cobol")).unwrap_err();
        assert!(matches!(err, CompileError::InvalidBackend { .. }));
    }

    #[rstest]
    fn test_compile_renders_backend_output() {
        let adapter = SnapshotAdapter::new(shop_snapshot());
        let compilation = compile(&adapter, &options("typescript")).unwrap();
        assert_eq!(compilation.backend, BackendId::TypeScript);
        assert!(compilation.output.contains("export interface Users {"));
        assert!(compilation.diagnostics.is_empty());
    }

    #[rstest]
    fn test_conflicting_columns_reported_and_dropped() {
        let ctx = context_with(vec![
            EntityDefinition::new("users", vec![PropertyDefinition::new("id", "int4")]),
            EntityDefinition::new("accounts", vec![
                PropertyDefinition::new("id", "varchar"),
                PropertyDefinition::new("label", "text"),
            ]),
        ]);
        let compilation = compile_context(ctx, BackendId::TypeDb).unwrap();
        assert_eq!(
            compilation.diagnostics,
            vec![Diagnostic::CoreferenceConflict {
                column: "id".to_string(),
                tables: vec!["accounts".to_string(), "users".to_string()],
                dropped: true,
            }]
        );
        assert!(compilation.context.entity("users").unwrap().property("id").is_some());
        assert!(compilation.filtered.entity("users").unwrap().property("id").is_none());
    }

    #[rstest]
    fn test_ignored_conflict_is_kept() {
        let mut ctx = context_with(vec![
            EntityDefinition::new("users", vec![PropertyDefinition::new("id", "int4")]),
            EntityDefinition::new("accounts", vec![PropertyDefinition::new("id", "varchar")]),
        ]);
        ctx.options.ignore_coreferences = vec!["id".to_string()];
        let compilation = compile_context(ctx, BackendId::TypeScript).unwrap();
        assert!(matches!(
            &compilation.diagnostics[0],
            Diagnostic::CoreferenceConflict { dropped: false, .. }
        ));
        assert!(compilation.output.contains("id: string;"));
    }

    #[rstest]
    fn test_fallback_reported() {
        let ctx = context_with(vec![EntityDefinition::new(
            "places",
            vec![PropertyDefinition::new("shape", "geometry")],
        )]);
        let compilation = compile_context(ctx, BackendId::Python).unwrap();
        assert_eq!(
            compilation.diagnostics,
            vec![Diagnostic::TypeFallback {
                entity: "places".to_string(),
                column: "shape".to_string(),
                raw_type: "geometry".to_string(),
            }]
        );
    }

    #[rstest]
    fn test_enum_collision_reported_under_warn() {
        let mut ctx = context_with(vec![EntityDefinition::new(
            "orders",
            vec![PropertyDefinition::new("status", "status")],
        )]);
        ctx.enums = vec![
            EnumDefinition::new("status", &["a", "b"]),
            EnumDefinition::new("status", &["a", "c"]),
        ];
        let compilation = compile_context(ctx, BackendId::TypeScript).unwrap();
        assert!(compilation
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::EnumCollision { name, .. } if name == "status")));
        assert!(compilation.output.contains("export type Status = \"a\" | \"b\";"));
    }

    #[rstest]
    fn test_strict_types_not_bypassed_by_shared_columns() {
        let mut ctx = context_with(vec![
            EntityDefinition::new("a", vec![PropertyDefinition::new("shape", "geometry")]),
            EntityDefinition::new("b", vec![PropertyDefinition::new("shape", "text")]),
        ]);
        ctx.options.throw_on_missing_type = true;
        let err = compile_context(ctx, BackendId::TypeScript).unwrap_err();
        assert!(matches!(
            err,
            CompileError::MissingTypeMapping { schema, entity, column, .. }
                if schema == "public" && entity == "a" && column == "shape"
        ));
    }

    #[rstest]
    fn test_same_label_edge_conflict_is_dropped() {
        let mut ctx = context_with(vec![
            EntityDefinition::new("Person", vec![PropertyDefinition::new("name", "string")]),
            EntityDefinition::new("Company", vec![PropertyDefinition::new("name", "string")]),
        ]);
        ctx.data_source = DataSource::Age;
        ctx.edges = vec![
            EdgeDefinition::new("KNOWS", "Person", "Company", vec![PropertyDefinition::new("since", "string")]),
            EdgeDefinition::new("KNOWS", "Person", "Person", vec![PropertyDefinition::new("since", "integer")]),
        ];
        let compilation = compile_context(ctx, BackendId::TypeDb).unwrap();

        assert_eq!(
            compilation.diagnostics,
            vec![Diagnostic::CoreferenceConflict {
                column: "since".to_string(),
                tables: vec!["Person_KNOWS_Company".to_string(), "Person_KNOWS_Person".to_string()],
                dropped: true,
            }]
        );
        assert!(compilation.filtered.edges.iter().all(|e| e.properties.is_empty()));
        assert!(!compilation.output.contains("since sub attribute"));
    }

    #[rstest]
    fn test_diagnostic_display() {
        let diagnostic = Diagnostic::TypeFallback {
            entity: "places".to_string(),
            column: "shape".to_string(),
            raw_type: "geometry".to_string(),
        };
        assert_eq!(diagnostic.to_string(), "no mapping for 'geometry' on places.shape");
    }
}
