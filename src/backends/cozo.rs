//! Cozo relation DDL.
//!
//! Generates `:create` statements. Primary key columns go before `=>`, every
//! other column after it:
//!
//! ```cozo
//! :create relation_name {
//!     key_field: Type
//!     =>
//!     value_field1: Type1,
//!     value_field2: Type2?
//! }
//! ```
//!
//! Graph edges are keyed by their endpoints.

use super::naming::{Casing, NameFormatters};
use super::{BackendId, Render, Scope};
use crate::coreference::Coreferences;
use crate::error::CompileError;
use crate::ir::{BuildContext, PropertyDefinition};

#[derive(Debug, Clone, Copy, Default)]
pub struct CozoBackend;

fn create_relation(name: &str, key_fields: &[String], value_fields: &[String]) -> String {
    let keys = key_fields.join(",\n");
    let values = value_fields.join(",\n");
    match (key_fields.is_empty(), value_fields.is_empty()) {
        (false, false) => format!(":create {} {{\n{}\n    =>\n{}\n}}\n", name, keys, values),
        (false, true) => format!(":create {} {{\n{}\n}}\n", name, keys),
        (true, false) => format!(":create {} {{\n{}\n}}\n", name, values),
        (true, true) => format!(":create {} {{}}\n", name),
    }
}

impl CozoBackend {
    fn field(&self, scope: &Scope<'_>, owner: &str, property: &PropertyDefinition) -> Result<String, CompileError> {
        Ok(format!(
            "    {}: {}",
            scope.names.attribute(&property.name),
            scope.property_type(owner, property)?
        ))
    }
}

impl Render for CozoBackend {
    fn id(&self) -> BackendId {
        BackendId::Cozo
    }

    fn default_formatters(&self) -> NameFormatters {
        NameFormatters {
            entity: Casing::Snake,
            attribute: Casing::Snake,
            relation: Casing::Snake,
            enum_type: Casing::Preserve,
        }
    }

    fn render(&self, ctx: &BuildContext, _coreferences: &Coreferences) -> Result<String, CompileError> {
        let scope = Scope::new(ctx, self);
        let mut statements = Vec::new();

        for entity in &ctx.entities {
            let mut keys = Vec::new();
            let mut values = Vec::new();
            for property in &entity.properties {
                let field = self.field(&scope, &entity.name, property)?;
                if property.is_primary_key {
                    keys.push(field);
                } else {
                    values.push(field);
                }
            }

            let mut statement = String::new();
            if let Some(comment) = ctx.table_comment(&entity.name) {
                statement.push_str(&format!("# {}\n", comment));
            }
            statement.push_str(&create_relation(&scope.names.entity(&entity.name), &keys, &values));
            statements.push(statement);
        }

        for edge in &ctx.edges {
            let keys = vec!["    source: Any".to_string(), "    target: Any".to_string()];
            let values = edge
                .properties
                .iter()
                .map(|p| self.field(&scope, &edge.name, p))
                .collect::<Result<Vec<_>, _>>()?;
            statements.push(format!(
                "# {} -> {}\n{}",
                edge.source,
                edge.target,
                create_relation(&scope.names.relation(&scope.edge_name(edge)), &keys, &values)
            ));
        }

        Ok(statements.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{DataSource, EdgeDefinition, EntityDefinition};
    use crate::test_utils::{context_with, shop_context};
    use rstest::rstest;

    /// Helper to normalize whitespace for comparison.
    fn normalize_whitespace(s: &str) -> String {
        s.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn render(ctx: &BuildContext) -> String {
        CozoBackend.render(ctx, &Coreferences::default()).unwrap()
    }

    #[rstest]
    fn test_primary_keys_before_arrow() {
        let output = render(&shop_context());
        assert!(output.contains(
            "# Registered customers\n:create users {\n    id: Int\n    =>\n    email: String,\n    name: String?,\n    tags: [String]?\n}\n"
        ));
    }

    #[rstest]
    fn test_enum_columns_are_strings() {
        let output = normalize_whitespace(&render(&shop_context()));
        assert!(output.contains(
            ":create orders { id: Int => user_id: Int, status: String, total: Float, created_at: String }"
        ));
    }

    #[rstest]
    fn test_relation_without_key() {
        let ctx = context_with(vec![EntityDefinition::new(
            "events",
            vec![PropertyDefinition::new("payload", "jsonb")],
        )]);
        assert_eq!(render(&ctx), ":create events {\n    payload: Json\n}\n");
    }

    #[rstest]
    fn test_edges_keyed_by_endpoints() {
        let mut ctx = context_with(vec![EntityDefinition::new("Person", vec![])]);
        ctx.data_source = DataSource::Age;
        ctx.edges.push(EdgeDefinition::new(
            "KNOWS",
            "Person",
            "Person",
            vec![PropertyDefinition::new("since", "integer")],
        ));
        let output = normalize_whitespace(&render(&ctx));
        assert!(output.contains("# Person -> Person :create knows { source: Any, target: Any => since: Int }"));
        assert!(output.contains(":create person {}"));
    }
}
