//! Error types for the compilation pipeline and the adapters that feed it.
//!
//! Only two conditions degrade instead of failing: a type with no mapping
//! (unless `throw_on_missing_type` is set) and coreference conflicts. Both are
//! reported as [`crate::compile::Diagnostic`] values rather than errors.

use thiserror::Error;

/// Failures raised while talking to a data source.
///
/// These propagate unchanged through the builder and abort the whole run.
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Failed to connect to data source: {message}")]
    Connection { message: String },

    #[error("{context} failed: {message}")]
    Query { context: String, message: String },

    #[error("Table '{table}' not found in schema '{schema}'")]
    TableNotFound { schema: String, table: String },

    #[error("Graph '{graph}' does not exist")]
    GraphNotFound { graph: String },

    #[error("Invalid schema snapshot '{path}': {message}")]
    Snapshot { path: String, message: String },

    #[error("Adapter has been closed")]
    Closed,
}

impl AdapterError {
    /// Wrap a driver error with the operation that produced it.
    pub fn query(context: impl Into<String>, err: impl std::fmt::Display) -> Self {
        AdapterError::Query {
            context: context.into(),
            message: err.to_string(),
        }
    }
}

/// Compilation error types.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("No tables found for schema '{schema}'")]
    MissingTableSet { schema: String },

    #[error("Enum '{name}' is defined twice with different values: [{}] vs [{}]", first.join(", "), second.join(", "))]
    EnumCollision {
        name: String,
        first: Vec<String>,
        second: Vec<String>,
    },

    #[error("No {backend} type mapping for '{raw_type}' ({data_source} column {schema}.{entity}.{column})")]
    MissingTypeMapping {
        raw_type: String,
        schema: String,
        data_source: String,
        backend: String,
        entity: String,
        column: String,
    },

    #[error("Invalid backend '{requested}'. Valid backends: {valid}")]
    InvalidBackend { requested: String, valid: String },

    #[error("Property '{property}' appears more than once in entity '{schema}.{entity}'")]
    DuplicateProperty {
        schema: String,
        entity: String,
        property: String,
    },

    #[error("Failed to render {backend} output: {message}")]
    Render { backend: String, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Adapter(#[from] AdapterError),
}
