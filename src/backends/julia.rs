//! Julia structs.
//!
//! Enums become `@enum` blocks whose instances are prefixed with the enum
//! name, since Julia enum instances share the enclosing namespace.

use heck::ToSnakeCase;

use super::naming::{Casing, NameFormatters};
use super::{BackendId, Render, Scope};
use crate::coreference::Coreferences;
use crate::error::CompileError;
use crate::ir::{BuildContext, PropertyDefinition};
use crate::types::Cardinality;

#[derive(Debug, Clone, Copy, Default)]
pub struct JuliaBackend;

fn enum_instance(enum_name: &str, value: &str) -> String {
    let instance = format!("{}_{}", enum_name, value).to_snake_case();
    if instance.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{}", instance)
    } else {
        instance
    }
}

fn docstring(text: &str) -> String {
    format!("\"\"\"\n    {}\n\"\"\"\n", text.replace("\"\"\"", "\\\"\\\"\\\""))
}

impl JuliaBackend {
    fn structure(
        &self,
        scope: &Scope<'_>,
        owner: &str,
        type_name: &str,
        doc: Option<&str>,
        properties: &[PropertyDefinition],
    ) -> Result<String, CompileError> {
        let mut out = String::new();
        if let Some(doc) = doc {
            out.push_str(&docstring(doc));
        }
        out.push_str(&format!("Base.@kwdef struct {}\n", type_name));
        for property in properties {
            let field = scope.names.attribute(&property.name);
            let field_type = scope.property_type(owner, property)?;
            if property.is_nullable {
                out.push_str(&format!("    {}::{} = missing\n", field, field_type));
            } else {
                out.push_str(&format!("    {}::{}\n", field, field_type));
            }
        }
        out.push_str("end\n");
        Ok(out)
    }
}

impl Render for JuliaBackend {
    fn id(&self) -> BackendId {
        BackendId::Julia
    }

    fn default_formatters(&self) -> NameFormatters {
        NameFormatters {
            entity: Casing::Pascal,
            attribute: Casing::Snake,
            relation: Casing::Pascal,
            enum_type: Casing::Pascal,
        }
    }

    fn render(&self, ctx: &BuildContext, _coreferences: &Coreferences) -> Result<String, CompileError> {
        let scope = Scope::new(ctx, self);

        let mut definitions = Vec::new();
        for def in &ctx.enums {
            let type_name = scope.names.enum_type(&def.name);
            let instances = def
                .values
                .iter()
                .map(|v| format!("    {}\n", enum_instance(&def.name, v)))
                .collect::<String>();
            definitions.push(format!("@enum {} begin\n{}end\n", type_name, instances));
        }
        for entity in &ctx.entities {
            definitions.push(self.structure(
                &scope,
                &entity.name,
                &scope.names.entity(&entity.name),
                ctx.table_comment(&entity.name),
                &entity.properties,
            )?);
        }
        for edge in &ctx.edges {
            let doc = format!("{} -> {}", scope.names.entity(&edge.source), scope.names.entity(&edge.target));
            definitions.push(self.structure(
                &scope,
                &edge.name,
                &scope.names.relation(&scope.edge_name(edge)),
                Some(&doc),
                &edge.properties,
            )?);
        }

        let scalars: Vec<String> = ctx
            .flattened_properties()
            .filter_map(|(_, p)| scope.resolver.resolve(&p.raw_type, Cardinality::SCALAR))
            .map(|r| r.scalar)
            .collect();
        let mut header: Vec<String> = Vec::new();
        if scalars.iter().any(|s| matches!(s.as_str(), "Date" | "DateTime" | "Time")) {
            header.push("using Dates".to_string());
        }
        if scalars.iter().any(|s| s == "UUID") {
            header.push("using UUIDs".to_string());
        }
        header.extend(ctx.imports.iter().cloned());

        let body = definitions.join("\n");
        if header.is_empty() {
            Ok(body)
        } else {
            Ok(format!("{}\n\n{}", header.join("\n"), body))
        }
    }
}
