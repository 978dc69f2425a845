//! Coreference analysis: attribute names reused across entities.
//!
//! Every property of every entity and edge is flattened into a
//! [`CoreferenceEntry`] and grouped by column name. Three views are derived
//! from the same grouping:
//!
//! - `all`: names used by two or more entities
//! - `warning`: names in `all` whose raw source types disagree
//! - `error`: names in `all` whose resolved types disagree under the backend
//!
//! `warning` and `error` are computed independently; neither is assumed to
//! contain the other.
//!
//! Edge properties are owned by the edge's key, so two edges sharing a label
//! between different endpoints count as two owners.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::CompileError;
use crate::ir::BuildContext;
use crate::types::{normalize, Cardinality, TypeResolver};

/// One occurrence of a column name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct CoreferenceEntry {
    pub table_name: String,
    pub column_name: String,
    /// Normalized raw type, with `[]` appended for arrays
    pub source_type: String,
    /// Resolved type ignoring nullability
    pub resolved_type: String,
}

/// Column name -> occurrences, sorted by table name then source type.
pub type CoreferenceMap = BTreeMap<String, Vec<CoreferenceEntry>>;

/// Coreference views for one `(IR, backend)` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Coreferences {
    pub all: CoreferenceMap,
    pub warning: CoreferenceMap,
    pub error: CoreferenceMap,
}

impl Coreferences {
    pub fn is_error(&self, column: &str) -> bool {
        self.error.contains_key(column)
    }

    pub fn is_warning(&self, column: &str) -> bool {
        self.warning.contains_key(column)
    }

    pub fn error_names(&self) -> impl Iterator<Item = &str> {
        self.error.keys().map(String::as_str)
    }
}

/// Analyze a build context under the resolver's backend.
///
/// A strict resolver fails on the first unmapped type, shared or not.
pub fn analyze(ctx: &BuildContext, resolver: &TypeResolver<'_>) -> Result<Coreferences, CompileError> {
    let mut grouped: CoreferenceMap = BTreeMap::new();

    for (owner, property) in ctx.flattened_properties() {
        let normalized = normalize(&property.raw_type);
        let is_array = property.is_array || normalized.is_array;
        let source_type = if is_array {
            format!("{}[]", normalized.name)
        } else {
            normalized.name
        };
        let resolved_type = resolver
            .resolve(&property.raw_type, Cardinality::of(property).non_null())
            .ok_or_else(|| resolver.missing_mapping(&owner, property))?
            .name;

        grouped
            .entry(property.name.clone())
            .or_default()
            .push(CoreferenceEntry {
                table_name: owner.to_string(),
                column_name: property.name.clone(),
                source_type,
                resolved_type,
            });
    }

    let mut coreferences = Coreferences::default();

    for (column, mut entries) in grouped {
        let owners: BTreeSet<&str> = entries.iter().map(|e| e.table_name.as_str()).collect();
        if owners.len() < 2 {
            continue;
        }

        entries.sort_by(|a, b| {
            a.table_name
                .cmp(&b.table_name)
                .then_with(|| a.source_type.cmp(&b.source_type))
        });

        let raw_types: BTreeSet<&str> = entries.iter().map(|e| e.source_type.as_str()).collect();
        let resolved_types: BTreeSet<&str> = entries.iter().map(|e| e.resolved_type.as_str()).collect();

        if raw_types.len() > 1 {
            coreferences.warning.insert(column.clone(), entries.clone());
        }
        if resolved_types.len() > 1 {
            coreferences.error.insert(column.clone(), entries.clone());
        }
        coreferences.all.insert(column, entries);
    }

    Ok(coreferences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::BackendId;
    use crate::ir::{EdgeDefinition, EntityDefinition, PropertyDefinition};
    use crate::test_utils::context_with;
    use rstest::rstest;

    fn run(ctx: &BuildContext, backend: BackendId) -> Coreferences {
        let resolver = TypeResolver::for_context(ctx, backend);
        analyze(ctx, &resolver).unwrap()
    }

    #[rstest]
    fn test_single_use_is_not_a_coreference() {
        let ctx = context_with(vec![
            EntityDefinition::new("users", vec![PropertyDefinition::new("email", "text")]),
            EntityDefinition::new("orders", vec![PropertyDefinition::new("total", "numeric")]),
        ]);
        let coreferences = run(&ctx, BackendId::TypeDb);
        assert!(coreferences.all.is_empty());
        assert!(coreferences.warning.is_empty());
        assert!(coreferences.error.is_empty());
    }

    #[rstest]
    fn test_same_types_only_in_all() {
        let ctx = context_with(vec![
            EntityDefinition::new("users", vec![PropertyDefinition::new("id", "int4")]),
            EntityDefinition::new("orders", vec![PropertyDefinition::new("id", "int4")]),
        ]);
        let coreferences = run(&ctx, BackendId::TypeDb);
        assert_eq!(coreferences.all["id"].len(), 2);
        assert!(!coreferences.is_warning("id"));
        assert!(!coreferences.is_error("id"));
    }

    #[rstest]
    fn test_enum_and_varchar_warn_but_do_not_error() {
        let ctx = context_with(vec![
            EntityDefinition::new(
                "users",
                vec![PropertyDefinition::new("id", "int"), PropertyDefinition::new("status", "enum")],
            ),
            EntityDefinition::new(
                "orders",
                vec![PropertyDefinition::new("id", "int"), PropertyDefinition::new("status", "varchar")],
            ),
        ]);
        let coreferences = run(&ctx, BackendId::TypeDb);
        assert!(coreferences.all.contains_key("status"));
        assert!(coreferences.is_warning("status"));
        assert!(!coreferences.is_error("status"));
    }

    #[rstest]
    fn test_int_and_varchar_error() {
        let ctx = context_with(vec![
            EntityDefinition::new("users", vec![PropertyDefinition::new("id", "int")]),
            EntityDefinition::new("accounts", vec![PropertyDefinition::new("id", "varchar")]),
        ]);
        let coreferences = run(&ctx, BackendId::TypeDb);
        assert!(coreferences.is_error("id"));
        assert!(coreferences.is_warning("id"));
        let resolved: Vec<_> = coreferences.error["id"]
            .iter()
            .map(|e| e.resolved_type.as_str())
            .collect();
        assert_eq!(resolved, vec!["string", "long"]);
    }

    #[rstest]
    fn test_raw_spelling_errors_only_where_targets_differ() {
        let ctx = context_with(vec![
            EntityDefinition::new("a", vec![PropertyDefinition::new("n", "int4")]),
            EntityDefinition::new("b", vec![PropertyDefinition::new("n", "int8")]),
        ]);
        let typedb = run(&ctx, BackendId::TypeDb);
        assert!(typedb.is_warning("n"));
        assert!(!typedb.is_error("n"));

        let julia = run(&ctx, BackendId::Julia);
        assert!(julia.is_warning("n"));
        assert!(julia.is_error("n"));
    }

    #[rstest]
    fn test_nullability_does_not_create_errors() {
        let ctx = context_with(vec![
            EntityDefinition::new("users", vec![PropertyDefinition::new("name", "text")]),
            EntityDefinition::new("teams", vec![PropertyDefinition::new("name", "text").nullable()]),
        ]);
        let coreferences = run(&ctx, BackendId::TypeScript);
        assert!(coreferences.all.contains_key("name"));
        assert!(!coreferences.is_error("name"));
    }

    #[rstest]
    fn test_array_mismatch_is_error() {
        let ctx = context_with(vec![
            EntityDefinition::new("posts", vec![PropertyDefinition::new("tags", "text").array()]),
            EntityDefinition::new("pages", vec![PropertyDefinition::new("tags", "text")]),
        ]);
        let coreferences = run(&ctx, BackendId::TypeScript);
        assert!(coreferences.is_warning("tags"));
        assert!(coreferences.is_error("tags"));
        assert_eq!(coreferences.all["tags"][0].source_type, "text");
        assert_eq!(coreferences.all["tags"][1].source_type, "text[]");
    }

    #[rstest]
    fn test_edges_participate() {
        let mut ctx = context_with(vec![EntityDefinition::new(
            "person",
            vec![PropertyDefinition::new("since", "string")],
        )]);
        ctx.data_source = crate::ir::DataSource::Age;
        ctx.edges.push(EdgeDefinition::new(
            "knows",
            "person",
            "person",
            vec![PropertyDefinition::new("since", "integer")],
        ));
        let coreferences = run(&ctx, BackendId::TypeDb);
        let owners: Vec<_> = coreferences.error["since"]
            .iter()
            .map(|e| e.table_name.as_str())
            .collect();
        assert_eq!(owners, vec!["knows", "person"]);
    }

    #[rstest]
    fn test_views_are_subsets_of_all() {
        let ctx = context_with(vec![
            EntityDefinition::new(
                "a",
                vec![
                    PropertyDefinition::new("x", "int4"),
                    PropertyDefinition::new("y", "text"),
                    PropertyDefinition::new("z", "uuid"),
                ],
            ),
            EntityDefinition::new(
                "b",
                vec![
                    PropertyDefinition::new("x", "text"),
                    PropertyDefinition::new("y", "varchar"),
                    PropertyDefinition::new("w", "uuid"),
                ],
            ),
        ]);
        for backend in BackendId::ALL {
            let coreferences = run(&ctx, backend);
            for name in coreferences.warning.keys().chain(coreferences.error.keys()) {
                assert!(coreferences.all.contains_key(name), "{} not in all for {}", name, backend);
            }
            assert!(!coreferences.all.contains_key("z"));
            assert!(!coreferences.all.contains_key("w"));
        }
    }

    #[rstest]
    fn test_strict_shared_unmapped_column_fails() {
        let mut ctx = context_with(vec![
            EntityDefinition::new("a", vec![PropertyDefinition::new("shape", "geometry")]),
            EntityDefinition::new("b", vec![PropertyDefinition::new("shape", "text")]),
        ]);
        ctx.options.throw_on_missing_type = true;
        let resolver = TypeResolver::for_context(&ctx, BackendId::TypeScript);
        let err = analyze(&ctx, &resolver).unwrap_err();
        assert!(matches!(
            err,
            CompileError::MissingTypeMapping { entity, column, raw_type, .. }
                if entity == "a" && column == "shape" && raw_type == "geometry"
        ));
    }

    #[rstest]
    fn test_lenient_shared_unmapped_column_uses_fallback() {
        let ctx = context_with(vec![
            EntityDefinition::new("a", vec![PropertyDefinition::new("shape", "geometry")]),
            EntityDefinition::new("b", vec![PropertyDefinition::new("shape", "text")]),
        ]);
        let coreferences = run(&ctx, BackendId::TypeScript);
        let resolved: Vec<_> = coreferences.error["shape"]
            .iter()
            .map(|e| e.resolved_type.as_str())
            .collect();
        assert_eq!(resolved, vec!["unknown", "string"]);
    }

    #[rstest]
    fn test_same_label_edges_are_separate_owners() {
        let mut ctx = context_with(vec![
            EntityDefinition::new("Person", vec![PropertyDefinition::new("name", "string")]),
            EntityDefinition::new("Company", vec![PropertyDefinition::new("name", "string")]),
        ]);
        ctx.data_source = crate::ir::DataSource::Age;
        ctx.edges = vec![
            EdgeDefinition::new("KNOWS", "Person", "Company", vec![PropertyDefinition::new("since", "string")]),
            EdgeDefinition::new("KNOWS", "Person", "Person", vec![PropertyDefinition::new("since", "integer")]),
        ];
        let coreferences = run(&ctx, BackendId::TypeDb);
        assert!(coreferences.is_warning("since"));
        assert!(coreferences.is_error("since"));
        let owners: Vec<_> = coreferences.error["since"]
            .iter()
            .map(|e| e.table_name.as_str())
            .collect();
        assert_eq!(owners, vec!["Person_KNOWS_Company", "Person_KNOWS_Person"]);
    }
}
