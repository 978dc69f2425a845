//! TypeQL schema.
//!
//! TypeQL attributes are typed globally, so every attribute is declared once
//! and owned by any number of entities or relations. Foreign keys and graph
//! edges both become relations with `source` and `target` roles.

use std::collections::{BTreeMap, BTreeSet};

use log::warn;

use super::naming::{Casing, NameFormatters};
use super::{BackendId, Render, Scope};
use crate::coreference::Coreferences;
use crate::error::CompileError;
use crate::ir::BuildContext;
use crate::types::TypeOrigin;

#[derive(Debug, Clone, Copy, Default)]
pub struct TypeDbBackend;

struct Attribute {
    value_type: String,
    regex: Option<String>,
}

#[derive(Default)]
struct Relation {
    owns: BTreeSet<String>,
    comment: Option<String>,
}

fn enum_regex(values: &[String]) -> String {
    let alternatives = values.iter().map(|v| regex::escape(v)).collect::<Vec<_>>();
    format!("^({})$", alternatives.join("|"))
}

/// `head,\n    clause,\n    clause;` or `head;`.
fn statement(head: String, clauses: Vec<String>) -> String {
    if clauses.is_empty() {
        format!("{};\n", head)
    } else {
        format!("{},\n    {};\n", head, clauses.join(",\n    "))
    }
}

impl Render for TypeDbBackend {
    fn id(&self) -> BackendId {
        BackendId::TypeDb
    }

    fn default_formatters(&self) -> NameFormatters {
        NameFormatters::uniform(Casing::Kebab)
    }

    fn render(&self, ctx: &BuildContext, _coreferences: &Coreferences) -> Result<String, CompileError> {
        let scope = Scope::new(ctx, self);
        let names = &scope.names;

        let mut attributes: BTreeMap<String, Attribute> = BTreeMap::new();
        for (owner, property) in ctx.flattened_properties() {
            let resolved = scope.resolve(&owner, property)?;
            let name = names.attribute(&property.name);
            match attributes.get(&name) {
                Some(existing) if existing.value_type != resolved.scalar => warn!(
                    "Attribute {} already declared as {}; ignoring {} from {}",
                    name, existing.value_type, resolved.scalar, owner
                ),
                Some(_) => {}
                None => {
                    let regex = match &resolved.origin {
                        TypeOrigin::Enum(enum_name) => ctx.enum_named(enum_name).map(|e| enum_regex(&e.values)),
                        _ => None,
                    };
                    attributes.insert(
                        name,
                        Attribute {
                            value_type: resolved.scalar,
                            regex,
                        },
                    );
                }
            }
        }

        let mut plays: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
        let mut relations: BTreeMap<String, Relation> = BTreeMap::new();

        for fk in &ctx.foreign_keys {
            let relation = names.relation(&format!("{}_{}", fk.source_table, fk.source_column));
            plays.entry(fk.source_table.as_str()).or_default().insert(format!("{}:source", relation));
            plays.entry(fk.target_table.as_str()).or_default().insert(format!("{}:target", relation));
            relations.entry(relation).or_default().comment = Some(format!(
                "{}.{} -> {}.{}",
                fk.source_table, fk.source_column, fk.target_table, fk.target_column
            ));
        }

        for edge in &ctx.edges {
            let relation = names.relation(&edge.name);
            plays.entry(edge.source.as_str()).or_default().insert(format!("{}:source", relation));
            plays.entry(edge.target.as_str()).or_default().insert(format!("{}:target", relation));
            let entry = relations.entry(relation).or_default();
            entry.owns.extend(edge.properties.iter().map(|p| names.attribute(&p.name)));
        }

        let mut out = String::from("define\n");

        if !attributes.is_empty() {
            out.push_str("\n# Attributes\n");
            for (name, attribute) in &attributes {
                let mut line = format!("{} sub attribute, value {}", name, attribute.value_type);
                if let Some(regex) = &attribute.regex {
                    line.push_str(&format!(", regex {}", serde_json::to_string(regex).unwrap_or_default()));
                }
                out.push_str(&line);
                out.push_str(";\n");
            }
        }

        out.push_str("\n# Entities\n");
        for entity in &ctx.entities {
            out.push('\n');
            if let Some(comment) = ctx.table_comment(&entity.name) {
                out.push_str(&format!("# {}\n", comment));
            }
            let single_key = entity.primary_key().count() == 1;
            let mut clauses: Vec<String> = entity
                .properties
                .iter()
                .map(|p| {
                    let key = if single_key && p.is_primary_key { " @key" } else { "" };
                    format!("owns {}{}", names.attribute(&p.name), key)
                })
                .collect();
            if let Some(roles) = plays.get(entity.name.as_str()) {
                clauses.extend(roles.iter().map(|r| format!("plays {}", r)));
            }
            out.push_str(&statement(format!("{} sub entity", names.entity(&entity.name)), clauses));
        }

        if !relations.is_empty() {
            out.push_str("\n# Relations\n");
            for (name, relation) in &relations {
                out.push('\n');
                if let Some(comment) = &relation.comment {
                    out.push_str(&format!("# {}\n", comment));
                }
                let mut clauses = vec!["relates source".to_string(), "relates target".to_string()];
                clauses.extend(relation.owns.iter().map(|a| format!("owns {}", a)));
                out.push_str(&statement(format!("{} sub relation", name), clauses));
            }
        }

        Ok(out)
    }
}
