//! Structured dumps of the filtered schema.
//!
//! `json` and `toon` serialize the same [`SchemaDocument`]: the IR as it
//! reached the backend, with each property's resolved type and the
//! coreference names that were reported for this run.

use serde::Serialize;

use super::naming::{Casing, NameFormatters};
use super::{BackendId, Render, Scope};
use crate::coreference::Coreferences;
use crate::error::CompileError;
use crate::ir::{BuildContext, DataSource, EnumDefinition, ForeignKeyDefinition, PropertyDefinition};

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBackend;

#[derive(Debug, Clone, Copy, Default)]
pub struct ToonBackend;

#[derive(Debug, Serialize)]
pub struct SchemaDocument {
    pub schema: String,
    pub data_source: DataSource,
    pub backend: BackendId,
    pub entities: Vec<DocumentEntity>,
    pub edges: Vec<DocumentEdge>,
    pub enums: Vec<EnumDefinition>,
    pub foreign_keys: Vec<ForeignKeyDefinition>,
    pub coreferences: DocumentCoreferences,
}

#[derive(Debug, Serialize)]
pub struct DocumentEntity {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub properties: Vec<DocumentProperty>,
}

#[derive(Debug, Serialize)]
pub struct DocumentEdge {
    pub name: String,
    pub source: String,
    pub target: String,
    pub properties: Vec<DocumentProperty>,
}

#[derive(Debug, Serialize)]
pub struct DocumentProperty {
    pub name: String,
    pub raw_type: String,
    #[serde(rename = "type")]
    pub resolved_type: String,
    pub nullable: bool,
    pub array: bool,
    pub primary_key: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Column names only; the full entries are available from `coreferences`.
#[derive(Debug, Serialize)]
pub struct DocumentCoreferences {
    pub warning: Vec<String>,
    pub error: Vec<String>,
}

impl SchemaDocument {
    fn build(scope: &Scope<'_>, backend: BackendId, coreferences: &Coreferences) -> Result<Self, CompileError> {
        let ctx = scope.ctx;
        let names = &scope.names;

        let properties = |owner: &str, props: &[PropertyDefinition]| -> Result<Vec<DocumentProperty>, CompileError> {
            props
                .iter()
                .map(|p| {
                    Ok(DocumentProperty {
                        name: names.attribute(&p.name),
                        raw_type: p.raw_type.clone(),
                        resolved_type: scope.property_type(owner, p)?,
                        nullable: p.is_nullable,
                        array: p.is_array,
                        primary_key: p.is_primary_key,
                        default: p.default_value.clone(),
                        comment: ctx.column_comment(owner, &p.name).map(str::to_string),
                    })
                })
                .collect()
        };

        let entities = ctx
            .entities
            .iter()
            .map(|e| {
                Ok(DocumentEntity {
                    name: names.entity(&e.name),
                    comment: ctx.table_comment(&e.name).map(str::to_string),
                    properties: properties(&e.name, &e.properties)?,
                })
            })
            .collect::<Result<Vec<_>, CompileError>>()?;

        let edges = ctx
            .edges
            .iter()
            .map(|e| {
                Ok(DocumentEdge {
                    name: names.relation(&scope.edge_name(e)),
                    source: names.entity(&e.source),
                    target: names.entity(&e.target),
                    properties: properties(&e.name, &e.properties)?,
                })
            })
            .collect::<Result<Vec<_>, CompileError>>()?;

        Ok(Self {
            schema: ctx.schema.clone(),
            data_source: ctx.data_source,
            backend,
            entities,
            edges,
            enums: ctx.enums.clone(),
            foreign_keys: ctx.foreign_keys.clone(),
            coreferences: DocumentCoreferences {
                warning: coreferences.warning.keys().cloned().collect(),
                error: coreferences.error.keys().cloned().collect(),
            },
        })
    }
}

fn render_error(backend: BackendId, err: serde_json::Error) -> CompileError {
    CompileError::Render {
        backend: backend.to_string(),
        message: err.to_string(),
    }
}

impl Render for JsonBackend {
    fn id(&self) -> BackendId {
        BackendId::Json
    }

    fn default_formatters(&self) -> NameFormatters {
        NameFormatters::uniform(Casing::Preserve)
    }

    fn render(&self, ctx: &BuildContext, coreferences: &Coreferences) -> Result<String, CompileError> {
        let scope = Scope::new(ctx, self);
        let document = SchemaDocument::build(&scope, self.id(), coreferences)?;
        serde_json::to_string_pretty(&document)
            .map(|json| json + "\n")
            .map_err(|e| render_error(self.id(), e))
    }
}

impl Render for ToonBackend {
    fn id(&self) -> BackendId {
        BackendId::Toon
    }

    fn default_formatters(&self) -> NameFormatters {
        NameFormatters::uniform(Casing::Preserve)
    }

    fn render(&self, ctx: &BuildContext, coreferences: &Coreferences) -> Result<String, CompileError> {
        let scope = Scope::new(ctx, self);
        let document = SchemaDocument::build(&scope, self.id(), coreferences)?;
        let value = serde_json::to_value(&document).map_err(|e| render_error(self.id(), e))?;
        Ok(toon::encode(&value, None))
    }
}
