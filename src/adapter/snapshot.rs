//! Schema snapshots: adapter output captured as JSON.
//!
//! A [`SchemaSnapshot`] is exactly what the IR builder fetches before merging,
//! so it can be written by `schemagen snapshot`, edited by hand, and compiled
//! later without a database.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::SchemaAdapter;
use crate::error::AdapterError;
use crate::ir::{
    ColumnComment, DataSource, EdgeDefinition, EntityDefinition, EnumDefinition, ForeignKeyDefinition,
    PrimaryKeyDefinition, TableComment,
};

/// Unmerged metadata of one schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    pub data_source: DataSource,
    pub schema: String,
    #[serde(default)]
    pub tables: Vec<EntityDefinition>,
    #[serde(default)]
    pub edges: Vec<EdgeDefinition>,
    #[serde(default)]
    pub enums: Vec<EnumDefinition>,
    #[serde(default)]
    pub primary_keys: Vec<PrimaryKeyDefinition>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyDefinition>,
    #[serde(default)]
    pub table_comments: Vec<TableComment>,
    #[serde(default)]
    pub column_comments: Vec<ColumnComment>,
}

impl SchemaSnapshot {
    pub fn new(data_source: DataSource, schema: impl Into<String>) -> Self {
        Self {
            data_source,
            schema: schema.into(),
            tables: Vec::new(),
            edges: Vec::new(),
            enums: Vec::new(),
            primary_keys: Vec::new(),
            foreign_keys: Vec::new(),
            table_comments: Vec::new(),
            column_comments: Vec::new(),
        }
    }

    pub fn with_table(mut self, table: EntityDefinition) -> Self {
        self.tables.push(table);
        self
    }

    pub fn with_edge(mut self, edge: EdgeDefinition) -> Self {
        self.edges.push(edge);
        self
    }

    pub fn with_enum(mut self, definition: EnumDefinition) -> Self {
        self.enums.push(definition);
        self
    }

    pub fn with_primary_key(mut self, table: &str, column: &str) -> Self {
        self.primary_keys.push(PrimaryKeyDefinition {
            table: table.to_string(),
            column: column.to_string(),
        });
        self
    }

    pub fn with_foreign_key(mut self, fk: ForeignKeyDefinition) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    pub fn with_table_comment(mut self, table: &str, comment: &str) -> Self {
        self.table_comments.push(TableComment {
            table: table.to_string(),
            comment: comment.to_string(),
        });
        self
    }

    pub fn with_column_comment(mut self, table: &str, column: &str, comment: &str) -> Self {
        self.column_comments.push(ColumnComment {
            table: table.to_string(),
            column: column.to_string(),
            comment: comment.to_string(),
        });
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Serves a [`SchemaSnapshot`] through the adapter capability.
#[derive(Debug)]
pub struct SnapshotAdapter {
    snapshot: SchemaSnapshot,
    concurrency: usize,
    failing_tables: BTreeSet<String>,
    latency: Option<Duration>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    closed: AtomicBool,
}

impl SnapshotAdapter {
    pub fn new(snapshot: SchemaSnapshot) -> Self {
        Self {
            snapshot,
            concurrency: 4,
            failing_tables: BTreeSet::new(),
            latency: None,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Read a snapshot file.
    pub fn load(path: &Path) -> Result<Self, AdapterError> {
        let snapshot_error = |message: String| AdapterError::Snapshot {
            path: path.display().to_string(),
            message,
        };
        let content = fs::read_to_string(path).map_err(|e| snapshot_error(e.to_string()))?;
        let snapshot: SchemaSnapshot =
            serde_json::from_str(&content).map_err(|e| snapshot_error(e.to_string()))?;
        Ok(Self::new(snapshot))
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Make `table()` fail for `table`, as a broken connection would.
    pub fn with_failing_table(mut self, table: &str) -> Self {
        self.failing_tables.insert(table.to_string());
        self
    }

    /// Delay every fetch, so overlapping calls can be observed.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Highest number of fetches observed running at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> &SchemaSnapshot {
        &self.snapshot
    }

    fn fetch<T>(&self, schema: &str, f: impl FnOnce(&SchemaSnapshot) -> T) -> Result<T, AdapterError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(AdapterError::Closed);
        }

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            thread::sleep(latency);
        }
        let result = if schema == self.snapshot.schema {
            Ok(f(&self.snapshot))
        } else {
            Err(AdapterError::Query {
                context: "Schema lookup".to_string(),
                message: format!("schema '{}' is not in this snapshot", schema),
            })
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

impl SchemaAdapter for SnapshotAdapter {
    fn data_source(&self) -> DataSource {
        self.snapshot.data_source
    }

    fn default_schema(&self) -> Result<String, AdapterError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(AdapterError::Closed);
        }
        Ok(self.snapshot.schema.clone())
    }

    fn table_names(&self, schema: &str) -> Result<Vec<String>, AdapterError> {
        // An unknown schema simply has no tables
        if schema != self.snapshot.schema {
            return Ok(Vec::new());
        }
        self.fetch(schema, |s| s.tables.iter().map(|t| t.name.clone()).collect())
    }

    fn enums(&self, schema: &str) -> Result<Vec<EnumDefinition>, AdapterError> {
        self.fetch(schema, |s| s.enums.clone())
    }

    fn primary_keys(&self, schema: &str) -> Result<Vec<PrimaryKeyDefinition>, AdapterError> {
        self.fetch(schema, |s| s.primary_keys.clone())
    }

    fn foreign_keys(&self, schema: &str) -> Result<Vec<ForeignKeyDefinition>, AdapterError> {
        self.fetch(schema, |s| s.foreign_keys.clone())
    }

    fn table_comments(&self, schema: &str) -> Result<Vec<TableComment>, AdapterError> {
        self.fetch(schema, |s| s.table_comments.clone())
    }

    fn column_comments(&self, schema: &str) -> Result<Vec<ColumnComment>, AdapterError> {
        self.fetch(schema, |s| s.column_comments.clone())
    }

    fn table(&self, schema: &str, table: &str) -> Result<EntityDefinition, AdapterError> {
        if self.failing_tables.contains(table) {
            return Err(AdapterError::query(
                format!("Column fetch for {}.{}", schema, table),
                "connection reset",
            ));
        }
        self.fetch(schema, |s| s.tables.iter().find(|t| t.name == table).cloned())?
            .ok_or_else(|| AdapterError::TableNotFound {
                schema: schema.to_string(),
                table: table.to_string(),
            })
    }

    fn edges(&self, schema: &str) -> Result<Vec<EdgeDefinition>, AdapterError> {
        self.fetch(schema, |s| s.edges.clone())
    }

    fn max_concurrency(&self) -> usize {
        self.concurrency
    }

    fn is_ready(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    fn close(&self) -> Result<(), AdapterError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
