//! Python dataclasses.

use heck::ToShoutySnakeCase;

use super::naming::{Casing, NameFormatters};
use super::{BackendId, Render, Scope};
use crate::coreference::Coreferences;
use crate::error::CompileError;
use crate::ir::{BuildContext, PropertyDefinition};
use crate::types::Cardinality;

#[derive(Debug, Clone, Copy, Default)]
pub struct PythonBackend;

fn member_name(value: &str) -> String {
    let name = value.to_shouty_snake_case();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("V_{}", name)
    } else {
        name
    }
}

impl PythonBackend {
    /// Nullable fields get a `None` default, so they are moved after the
    /// required ones; relative order is otherwise kept.
    fn dataclass(
        &self,
        scope: &Scope<'_>,
        owner: &str,
        class_name: &str,
        doc: Option<&str>,
        properties: &[PropertyDefinition],
    ) -> Result<String, CompileError> {
        let mut out = format!("@dataclass\nclass {}:\n", class_name);
        if let Some(doc) = doc {
            out.push_str(&format!("    \"\"\"{}\"\"\"\n", doc.replace("\"\"\"", "'''")));
            if !properties.is_empty() {
                out.push('\n');
            }
        }
        if properties.is_empty() && doc.is_none() {
            out.push_str("    pass\n");
        }

        let (required, optional): (Vec<_>, Vec<_>) = properties.iter().partition(|p| !p.is_nullable);
        for property in required {
            out.push_str(&format!(
                "    {}: {}\n",
                scope.names.attribute(&property.name),
                scope.property_type(owner, property)?
            ));
        }
        for property in optional {
            out.push_str(&format!(
                "    {}: {} = None\n",
                scope.names.attribute(&property.name),
                scope.property_type(owner, property)?
            ));
        }
        Ok(out)
    }

    fn header(&self, scope: &Scope<'_>, ctx: &BuildContext) -> String {
        let scalars: Vec<String> = ctx
            .flattened_properties()
            .filter_map(|(_, p)| scope.resolver.resolve(&p.raw_type, Cardinality::SCALAR))
            .map(|r| r.scalar)
            .collect();
        let uses = |module: &str| scalars.iter().any(|s| s.starts_with(module));

        let mut lines = vec!["from __future__ import annotations".to_string(), String::new()];
        for module in ["datetime", "decimal", "uuid"] {
            if uses(&format!("{}.", module)) {
                lines.push(format!("import {}", module));
            }
        }
        if !ctx.entities.is_empty() || !ctx.edges.is_empty() {
            lines.push("from dataclasses import dataclass".to_string());
        }
        if !ctx.enums.is_empty() {
            lines.push("from enum import Enum".to_string());
        }

        let mut typing = Vec::new();
        if scalars.iter().any(|s| s == "Any") {
            typing.push("Any");
        }
        if ctx.flattened_properties().any(|(_, p)| p.is_nullable) {
            typing.push("Optional");
        }
        if !typing.is_empty() {
            lines.push(format!("from typing import {}", typing.join(", ")));
        }

        if !ctx.imports.is_empty() {
            lines.push(String::new());
            lines.extend(ctx.imports.iter().cloned());
        }
        lines.join("\n") + "\n"
    }
}

impl Render for PythonBackend {
    fn id(&self) -> BackendId {
        BackendId::Python
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
        let mut blocks = vec![self.header(&scope, ctx)];

        for def in &ctx.enums {
            let mut block = format!("class {}(str, Enum):\n", scope.names.enum_type(&def.name));
            if def.values.is_empty() {
                block.push_str("    pass\n");
            }
            for value in &def.values {
                block.push_str(&format!(
                    "    {} = {}\n",
                    member_name(value),
                    serde_json::to_string(value).unwrap_or_default()
                ));
            }
            blocks.push(block);
        }

        for entity in &ctx.entities {
            blocks.push(self.dataclass(
                &scope,
                &entity.name,
                &scope.names.entity(&entity.name),
                ctx.table_comment(&entity.name),
                &entity.properties,
            )?);
        }
        for edge in &ctx.edges {
            let doc = format!("{} -> {}", scope.names.entity(&edge.source), scope.names.entity(&edge.target));
            blocks.push(self.dataclass(
                &scope,
                &edge.name,
                &scope.names.relation(&scope.edge_name(edge)),
                Some(&doc),
                &edge.properties,
            )?);
        }

        Ok(blocks.join("\n\n"))
    }
}
