//! TypeScript declarations.

use super::naming::{Casing, NameFormatters};
use super::{BackendId, Render, Scope};
use crate::coreference::Coreferences;
use crate::error::CompileError;
use crate::ir::{BuildContext, PropertyDefinition};

#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptBackend;

/// Property keys that are not plain identifiers are emitted quoted.
fn property_key(name: &str) -> String {
    let mut chars = name.chars();
    let plain = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if plain {
        name.to_string()
    } else {
        serde_json::to_string(name).unwrap_or_else(|_| format!("\"{}\"", name))
    }
}

fn doc_comment(indent: &str, text: &str) -> String {
    format!("{}/** {} */\n", indent, text.replace("*/", "* /"))
}

impl TypeScriptBackend {
    fn interface(
        &self,
        scope: &Scope<'_>,
        owner: &str,
        type_name: &str,
        comment: Option<&str>,
        properties: &[PropertyDefinition],
    ) -> Result<String, CompileError> {
        let mut out = String::new();
        if let Some(comment) = comment {
            out.push_str(&doc_comment("", comment));
        }
        out.push_str(&format!("export interface {} {{\n", type_name));
        for property in properties {
            if let Some(comment) = scope.ctx.column_comment(owner, &property.name) {
                out.push_str(&doc_comment("  ", comment));
            }
            out.push_str(&format!(
                "  {}: {};\n",
                property_key(&scope.names.attribute(&property.name)),
                scope.property_type(owner, property)?
            ));
        }
        out.push_str("}\n");
        Ok(out)
    }
}

impl Render for TypeScriptBackend {
    fn id(&self) -> BackendId {
        BackendId::TypeScript
    }

    fn default_formatters(&self) -> NameFormatters {
        NameFormatters {
            entity: Casing::Pascal,
            attribute: Casing::Preserve,
            relation: Casing::Pascal,
            enum_type: Casing::Pascal,
        }
    }

    fn render(&self, ctx: &BuildContext, _coreferences: &Coreferences) -> Result<String, CompileError> {
        let scope = Scope::new(ctx, self);
        let mut blocks = Vec::new();

        if !ctx.imports.is_empty() {
            blocks.push(ctx.imports.join("\n") + "\n");
        }

        for def in &ctx.enums {
            let values = def
                .values
                .iter()
                .map(|v| serde_json::to_string(v).unwrap_or_else(|_| format!("\"{}\"", v)))
                .collect::<Vec<_>>();
            let union = if values.is_empty() {
                "never".to_string()
            } else {
                values.join(" | ")
            };
            blocks.push(format!(
                "export type {} = {};\n",
                scope.names.enum_type(&def.name),
                union
            ));
        }

        for entity in &ctx.entities {
            blocks.push(self.interface(
                &scope,
                &entity.name,
                &scope.names.entity(&entity.name),
                ctx.table_comment(&entity.name),
                &entity.properties,
            )?);
        }

        for edge in &ctx.edges {
            let comment = format!("{} -> {}", scope.names.entity(&edge.source), scope.names.entity(&edge.target));
            blocks.push(self.interface(
                &scope,
                &edge.name,
                &scope.names.relation(&scope.edge_name(edge)),
                Some(&comment),
                &edge.properties,
            )?);
        }

        Ok(blocks.join("\n"))
    }
}
