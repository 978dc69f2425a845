//! Pre-flight validation and conflict-driven filtering.
//!
//! Runs once per backend, right before rendering. The input IR is left
//! untouched; filtering produces a new [`BuildContext`].

use std::collections::BTreeSet;

use log::{info, warn};
use serde::Serialize;

use crate::config::EnumCollisionPolicy;
use crate::coreference::Coreferences;
use crate::error::CompileError;
use crate::ir::{BuildContext, EnumDefinition, ForeignKeyDefinition, PropertyDefinition};

/// Two enums with one name and different values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumCollision {
    pub name: String,
    /// Values of the definition that is kept
    pub first: Vec<String>,
    pub second: Vec<String>,
}

impl From<EnumCollision> for CompileError {
    fn from(collision: EnumCollision) -> Self {
        CompileError::EnumCollision {
            name: collision.name,
            first: collision.first,
            second: collision.second,
        }
    }
}

/// A property removed from an entity or edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedProperty {
    pub owner: String,
    pub column: String,
}

/// Result of [`postprocess`].
#[derive(Debug, Clone)]
pub struct Postprocessed {
    /// Filtered copy of the input IR
    pub context: BuildContext,
    pub dropped_properties: Vec<DroppedProperty>,
    pub dropped_foreign_keys: Vec<ForeignKeyDefinition>,
    pub enum_collisions: Vec<EnumCollision>,
}

/// Every enum name defined with more than one value list.
///
/// The first definition in `(name, values)` order is the one kept.
pub fn find_enum_collisions(enums: &[EnumDefinition]) -> Vec<EnumCollision> {
    let mut sorted: Vec<&EnumDefinition> = enums.iter().collect();
    sorted.sort_by(|a, b| (&a.name, &a.values).cmp(&(&b.name, &b.values)));

    let mut collisions = Vec::new();
    let mut kept: Option<&EnumDefinition> = None;
    for def in sorted {
        match kept {
            Some(first) if first.name == def.name => {
                if first.values != def.values {
                    collisions.push(EnumCollision {
                        name: def.name.clone(),
                        first: first.values.clone(),
                        second: def.values.clone(),
                    });
                }
            }
            _ => kept = Some(def),
        }
    }
    collisions
}

/// Check enum collisions against the configured policy.
pub fn preflight(ctx: &BuildContext, policy: EnumCollisionPolicy) -> Result<Vec<EnumCollision>, CompileError> {
    let collisions = find_enum_collisions(&ctx.enums);
    if policy == EnumCollisionPolicy::Fail {
        if let Some(first) = collisions.first() {
            return Err(first.clone().into());
        }
    }
    for collision in &collisions {
        warn!(
            "Enum '{}' in schema '{}' is defined with different values: [{}] vs [{}]; keeping the first",
            collision.name,
            ctx.schema,
            collision.first.join(", "),
            collision.second.join(", ")
        );
    }
    Ok(collisions)
}

fn dedupe_enums(enums: &[EnumDefinition]) -> Vec<EnumDefinition> {
    let mut sorted = enums.to_vec();
    sorted.sort();
    sorted.dedup_by(|later, first| later.name == first.name);
    sorted
}

/// Keep the properties of `owner` whose names are not dropped.
fn filter_properties(
    owner: &str,
    properties: &[PropertyDefinition],
    drop: &BTreeSet<&str>,
    dropped: &mut Vec<DroppedProperty>,
) -> Vec<PropertyDefinition> {
    properties
        .iter()
        .filter(|p| {
            if drop.contains(p.name.as_str()) {
                dropped.push(DroppedProperty {
                    owner: owner.to_string(),
                    column: p.name.clone(),
                });
                false
            } else {
                true
            }
        })
        .cloned()
        .collect()
}

/// Validate and filter the IR for one backend.
///
/// Properties whose names are in the coreference `error` tier are dropped from
/// every entity and edge, unless listed in `ignore_coreferences`. Foreign keys
/// that no longer resolve are dropped with them. An IR left with no entities
/// is a [`CompileError::MissingTableSet`].
pub fn postprocess(ctx: &BuildContext, coreferences: &Coreferences) -> Result<Postprocessed, CompileError> {
    let enum_collisions = preflight(ctx, ctx.options.enum_collision)?;

    let ignored: BTreeSet<&str> = ctx.options.ignore_coreferences.iter().map(String::as_str).collect();
    let drop: BTreeSet<&str> = coreferences
        .error_names()
        .filter(|name| !ignored.contains(name))
        .collect();

    let mut dropped_properties = Vec::new();
    let mut filtered = ctx.clone();
    for entity in &mut filtered.entities {
        entity.properties = filter_properties(&entity.name, &entity.properties, &drop, &mut dropped_properties);
    }
    for edge in &mut filtered.edges {
        let owner = ctx.edge_key(edge).into_owned();
        edge.properties = filter_properties(&owner, &edge.properties, &drop, &mut dropped_properties);
    }

    for dropped in &dropped_properties {
        warn!(
            "Dropped {}.{}.{}: column name is reused with conflicting types",
            ctx.schema, dropped.owner, dropped.column
        );
    }

    let resolves = |table: &str, column: &str| {
        filtered
            .entity(table)
            .is_some_and(|e| e.property(column).is_some())
    };
    let (kept, dropped_foreign_keys): (Vec<_>, Vec<_>) = filtered
        .foreign_keys
        .iter()
        .cloned()
        .partition(|fk| resolves(&fk.source_table, &fk.source_column) && resolves(&fk.target_table, &fk.target_column));
    for fk in &dropped_foreign_keys {
        warn!(
            "Dropped foreign key {}.{} -> {}.{}",
            fk.source_table, fk.source_column, fk.target_table, fk.target_column
        );
    }
    filtered.foreign_keys = kept;
    filtered.enums = dedupe_enums(&ctx.enums);

    if filtered.entities.is_empty() {
        return Err(CompileError::MissingTableSet {
            schema: ctx.schema.clone(),
        });
    }

    if !dropped_properties.is_empty() {
        info!(
            "Postprocessing removed {} properties and {} foreign keys",
            dropped_properties.len(),
            dropped_foreign_keys.len()
        );
    }

    Ok(Postprocessed {
        context: filtered,
        dropped_properties,
        dropped_foreign_keys,
        enum_collisions,
    })
}
