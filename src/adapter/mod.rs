//! Data source adapters.
//!
//! An adapter exposes the metadata of one live data source. The IR builder is
//! the only consumer; it may call the fetch methods from several threads at
//! once, up to [`SchemaAdapter::max_concurrency`].
//!
//! # Implementations
//!
//! | Adapter | Source | Notes |
//! |---------|--------|-------|
//! | `PostgresAdapter` | PostgreSQL catalogs | pool of blocking clients |
//! | `AgeAdapter` | Apache AGE graph | property types inferred from samples |
//! | `SnapshotAdapter` | JSON snapshot | offline compilation and tests |

mod age;
mod escape;
mod postgres;
mod snapshot;

pub use age::AgeAdapter;
pub use postgres::PostgresAdapter;
pub use snapshot::{SchemaSnapshot, SnapshotAdapter};

use crate::config::SourceConfig;
use crate::error::AdapterError;
use crate::ir::{
    ColumnComment, DataSource, EdgeDefinition, EntityDefinition, EnumDefinition, ForeignKeyDefinition,
    PrimaryKeyDefinition, TableComment,
};

/// Metadata access for one data source.
pub trait SchemaAdapter: Send + Sync {
    /// Kind of source, which selects the raw type vocabulary.
    fn data_source(&self) -> DataSource;

    fn default_schema(&self) -> Result<String, AdapterError>;

    fn table_names(&self, schema: &str) -> Result<Vec<String>, AdapterError>;

    fn enums(&self, schema: &str) -> Result<Vec<EnumDefinition>, AdapterError>;

    fn primary_keys(&self, schema: &str) -> Result<Vec<PrimaryKeyDefinition>, AdapterError>;

    fn foreign_keys(&self, schema: &str) -> Result<Vec<ForeignKeyDefinition>, AdapterError>;

    fn table_comments(&self, schema: &str) -> Result<Vec<TableComment>, AdapterError>;

    fn column_comments(&self, schema: &str) -> Result<Vec<ColumnComment>, AdapterError>;

    /// Columns of one table (or properties of one node label), in source order.
    fn table(&self, schema: &str, table: &str) -> Result<EntityDefinition, AdapterError>;

    /// Graph relationships. Relational sources have none.
    fn edges(&self, _schema: &str) -> Result<Vec<EdgeDefinition>, AdapterError> {
        Ok(Vec::new())
    }

    /// Number of fetches the adapter can serve at the same time.
    fn max_concurrency(&self) -> usize {
        1
    }

    fn is_ready(&self) -> bool;

    /// Release connections. Later calls fail with [`AdapterError::Closed`].
    fn close(&self) -> Result<(), AdapterError>;
}

/// Open the adapter described by a source configuration.
pub fn connect(source: &SourceConfig) -> Result<Box<dyn SchemaAdapter>, AdapterError> {
    let adapter = match source {
        SourceConfig::Postgres(config) => {
            Box::new(PostgresAdapter::connect(config)?) as Box<dyn SchemaAdapter>
        }
        SourceConfig::Age(config) => Box::new(AgeAdapter::connect(config)?) as Box<dyn SchemaAdapter>,
        SourceConfig::Snapshot { path } => {
            Box::new(SnapshotAdapter::load(path)?) as Box<dyn SchemaAdapter>
        }
    };
    Ok(adapter)
}
