//! TypeDB data loader configuration.
//!
//! Maps every table column to the TypeQL attribute it loads into, and every
//! foreign key or edge to a relation whose players are matched by key
//! columns. Names follow the same casing as the `typedb` backend so the two
//! outputs line up.

use serde::Serialize;

use super::naming::{Casing, NameFormatters};
use super::{BackendId, Render, Scope};
use crate::coreference::Coreferences;
use crate::error::CompileError;
use crate::ir::{BuildContext, EntityDefinition, PropertyDefinition};

#[derive(Debug, Clone, Copy, Default)]
pub struct LoaderBackend;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoaderConfig {
    schema: String,
    entities: Vec<EntityLoader>,
    relations: Vec<RelationLoader>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EntityLoader {
    table: String,
    concept: String,
    attributes: Vec<AttributeLoader>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AttributeLoader {
    column: String,
    attribute: String,
    value_type: String,
    key: bool,
    required: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RelationLoader {
    relation: String,
    table: String,
    players: Vec<PlayerLoader>,
    attributes: Vec<AttributeLoader>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlayerLoader {
    role: &'static str,
    concept: String,
    /// Column of the loaded row holding the player's key
    #[serde(skip_serializing_if = "Option::is_none")]
    match_column: Option<String>,
    /// Attribute of the player the column is matched against
    #[serde(skip_serializing_if = "Option::is_none")]
    match_attribute: Option<String>,
}

impl LoaderBackend {
    fn attributes(
        &self,
        scope: &Scope<'_>,
        owner: &str,
        properties: &[PropertyDefinition],
    ) -> Result<Vec<AttributeLoader>, CompileError> {
        properties
            .iter()
            .map(|p| {
                Ok(AttributeLoader {
                    column: p.name.clone(),
                    attribute: scope.names.attribute(&p.name),
                    value_type: scope.resolve(owner, p)?.scalar,
                    key: p.is_primary_key,
                    required: !p.is_nullable && !p.has_default,
                })
            })
            .collect()
    }
}

/// The key column of an entity, when it has exactly one.
fn single_key(entity: Option<&EntityDefinition>) -> Option<&str> {
    let entity = entity?;
    let mut keys = entity.primary_key();
    match (keys.next(), keys.next()) {
        (Some(key), None) => Some(key.name.as_str()),
        _ => None,
    }
}

impl Render for LoaderBackend {
    fn id(&self) -> BackendId {
        BackendId::Loader
    }

    fn default_formatters(&self) -> NameFormatters {
        NameFormatters::uniform(Casing::Kebab)
    }

    fn render(&self, ctx: &BuildContext, _coreferences: &Coreferences) -> Result<String, CompileError> {
        let scope = Scope::new(ctx, self);
        let names = &scope.names;

        let entities = ctx
            .entities
            .iter()
            .map(|entity| {
                Ok(EntityLoader {
                    table: entity.name.clone(),
                    concept: names.entity(&entity.name),
                    attributes: self.attributes(&scope, &entity.name, &entity.properties)?,
                })
            })
            .collect::<Result<Vec<_>, CompileError>>()?;

        let mut relations = Vec::new();
        for fk in &ctx.foreign_keys {
            let source_key = single_key(ctx.entity(&fk.source_table));
            relations.push(RelationLoader {
                relation: names.relation(&format!("{}_{}", fk.source_table, fk.source_column)),
                table: fk.source_table.clone(),
                players: vec![
                    PlayerLoader {
                        role: "source",
                        concept: names.entity(&fk.source_table),
                        match_column: source_key.map(str::to_string),
                        match_attribute: source_key.map(|k| names.attribute(k)),
                    },
                    PlayerLoader {
                        role: "target",
                        concept: names.entity(&fk.target_table),
                        match_column: Some(fk.source_column.clone()),
                        match_attribute: Some(names.attribute(&fk.target_column)),
                    },
                ],
                attributes: Vec::new(),
            });
        }
        for edge in &ctx.edges {
            relations.push(RelationLoader {
                relation: names.relation(&edge.name),
                table: edge.name.clone(),
                players: vec![
                    PlayerLoader {
                        role: "source",
                        concept: names.entity(&edge.source),
                        match_column: None,
                        match_attribute: None,
                    },
                    PlayerLoader {
                        role: "target",
                        concept: names.entity(&edge.target),
                        match_column: None,
                        match_attribute: None,
                    },
                ],
                attributes: self.attributes(&scope, &edge.name, &edge.properties)?,
            });
        }

        let config = LoaderConfig {
            schema: ctx.schema.clone(),
            entities,
            relations,
        };
        serde_json::to_string_pretty(&config)
            .map(|json| json + "\n")
            .map_err(|e| CompileError::Render {
                backend: self.id().to_string(),
                message: e.to_string(),
            })
    }
}
