//! Canonical schema model shared by every backend.
//!
//! These types are source-agnostic: the Postgres adapter, the AGE graph adapter
//! and schema snapshots all produce the same definitions, and every backend
//! consumes only this model.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::CompileOptions;

/// Kind of origin system, which decides the raw type vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Relational PostgreSQL schema
    Postgres,
    /// Apache AGE property graph
    Age,
}

impl DataSource {
    pub fn name(&self) -> &'static str {
        match self {
            DataSource::Postgres => "postgres",
            DataSource::Age => "age",
        }
    }

    /// Graph sources report nodes and edges instead of tables and keys.
    pub fn is_graph(&self) -> bool {
        matches!(self, DataSource::Age)
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A column of a table, or a property of a graph node or edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,

    /// Type name as reported by the source, before translation
    pub raw_type: String,

    #[serde(default)]
    pub is_nullable: bool,

    #[serde(default)]
    pub has_default: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,

    #[serde(default)]
    pub is_array: bool,

    #[serde(default)]
    pub is_primary_key: bool,
}

impl PropertyDefinition {
    /// A non-null, scalar property with no default.
    pub fn new(name: impl Into<String>, raw_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_type: raw_type.into(),
            is_nullable: false,
            has_default: false,
            default_value: None,
            is_array: false,
            is_primary_key: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.is_nullable = true;
        self
    }

    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.has_default = true;
        self.default_value = Some(value.into());
        self
    }
}

/// An enumerated type and its ordered labels.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnumDefinition {
    pub name: String,
    pub values: Vec<String>,

    /// Column the enum was declared on, for sources with inline enums
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

impl EnumDefinition {
    pub fn new(name: impl Into<String>, values: &[&str]) -> Self {
        Self {
            name: name.into(),
            values: values.iter().map(|v| v.to_string()).collect(),
            column: None,
        }
    }
}

/// A single-column reference from one table to another.
///
/// Field order doubles as the sort order used when the IR is emitted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ForeignKeyDefinition {
    pub source_table: String,
    pub source_column: String,
    pub target_table: String,
    pub target_column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<String>,
}

impl ForeignKeyDefinition {
    pub fn new(
        source_table: impl Into<String>,
        source_column: impl Into<String>,
        target_table: impl Into<String>,
        target_column: impl Into<String>,
    ) -> Self {
        Self {
            source_table: source_table.into(),
            source_column: source_column.into(),
            target_table: target_table.into(),
            target_column: target_column.into(),
            constraint: None,
        }
    }

    /// True if either end of the key is the given column.
    pub fn references(&self, table: &str, column: &str) -> bool {
        (self.source_table == table && self.source_column == column)
            || (self.target_table == table && self.target_column == column)
    }
}

/// Primary key membership of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKeyDefinition {
    pub table: String,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableComment {
    pub table: String,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnComment {
    pub table: String,
    pub column: String,
    pub comment: String,
}

/// A table or graph node with its ordered properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDefinition {
    pub name: String,
    pub properties: Vec<PropertyDefinition>,
}

impl EntityDefinition {
    pub fn new(name: impl Into<String>, properties: Vec<PropertyDefinition>) -> Self {
        Self {
            name: name.into(),
            properties,
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn primary_key(&self) -> impl Iterator<Item = &PropertyDefinition> {
        self.properties.iter().filter(|p| p.is_primary_key)
    }
}

/// A graph relationship between two entities of the same compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDefinition {
    pub name: String,
    /// Name of the source entity
    pub source: String,
    /// Name of the target entity
    pub target: String,
    #[serde(default)]
    pub properties: Vec<PropertyDefinition>,
}

impl EdgeDefinition {
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        properties: Vec<PropertyDefinition>,
    ) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            target: target.into(),
            properties,
        }
    }
}

/// Root of the intermediate representation.
///
/// Built once per run and never mutated afterwards; filtering produces a new
/// value so the original build stays available for diagnostics.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub schema: String,
    pub data_source: DataSource,
    pub options: CompileOptions,
    pub entities: Vec<EntityDefinition>,
    pub edges: Vec<EdgeDefinition>,
    pub enums: Vec<EnumDefinition>,
    pub foreign_keys: Vec<ForeignKeyDefinition>,
    /// table -> comment
    pub table_comments: BTreeMap<String, String>,
    /// table -> column -> comment
    pub column_comments: BTreeMap<String, BTreeMap<String, String>>,
    pub imports: Vec<String>,
}

impl BuildContext {
    pub fn entity(&self, name: &str) -> Option<&EntityDefinition> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn enum_named(&self, name: &str) -> Option<&EnumDefinition> {
        self.enums.iter().find(|e| e.name == name)
    }

    pub fn table_comment(&self, table: &str) -> Option<&str> {
        self.table_comments.get(table).map(String::as_str)
    }

    pub fn column_comment(&self, table: &str, column: &str) -> Option<&str> {
        self.column_comments
            .get(table)
            .and_then(|columns| columns.get(column))
            .map(String::as_str)
    }

    /// Identity of an edge type. Edges sharing a label across several
    /// endpoint pairs get the endpoints appended.
    pub fn edge_key<'e>(&self, edge: &'e EdgeDefinition) -> Cow<'e, str> {
        let shared = self.edges.iter().filter(|e| e.name == edge.name).count() > 1;
        if shared {
            Cow::Owned(format!("{}_{}_{}", edge.source, edge.name, edge.target))
        } else {
            Cow::Borrowed(edge.name.as_str())
        }
    }

    /// Every `(owner, property)` pair across entities and edges. Edges are
    /// owned by their [`edge_key`](Self::edge_key).
    pub fn flattened_properties(&self) -> impl Iterator<Item = (Cow<'_, str>, &PropertyDefinition)> {
        let entity_props = self
            .entities
            .iter()
            .flat_map(|e| e.properties.iter().map(move |p| (Cow::Borrowed(e.name.as_str()), p)));
        let edge_props = self.edges.iter().flat_map(move |e| {
            let key = self.edge_key(e);
            e.properties.iter().map(move |p| (key.clone(), p))
        });
        entity_props.chain(edge_props)
    }

    /// Foreign keys leaving the given table.
    pub fn foreign_keys_from<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a ForeignKeyDefinition> {
        self.foreign_keys.iter().filter(move |fk| fk.source_table == table)
    }
}
