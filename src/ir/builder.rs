//! IR builder: fetches adapter metadata and merges it into a [`BuildContext`].
//!
//! Fetching and merging are separate steps. [`IrBuilder::fetch`] issues the
//! independent adapter calls (enums, keys, comments, edges, one call per table)
//! on a bounded pool of scoped worker threads and returns the raw
//! [`SchemaSnapshot`]. [`merge`] is the single synchronization point; it sorts
//! everything it emits, so its output does not depend on which fetch finished
//! first.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;

use log::{debug, info};

use super::definition::{BuildContext, EdgeDefinition, EntityDefinition, PropertyDefinition};
use crate::adapter::{SchemaAdapter, SchemaSnapshot};
use crate::config::CompileOptions;
use crate::error::{AdapterError, CompileError};
use crate::ir::{
    ColumnComment, EnumDefinition, ForeignKeyDefinition, PrimaryKeyDefinition, TableComment,
};

/// One independent adapter call.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FetchJob {
    Enums,
    PrimaryKeys,
    ForeignKeys,
    TableComments,
    ColumnComments,
    Edges,
    Table(String),
}

enum Fetched {
    Enums(Vec<EnumDefinition>),
    PrimaryKeys(Vec<PrimaryKeyDefinition>),
    ForeignKeys(Vec<ForeignKeyDefinition>),
    TableComments(Vec<TableComment>),
    ColumnComments(Vec<ColumnComment>),
    Edges(Vec<EdgeDefinition>),
    Table(EntityDefinition),
}

impl FetchJob {
    fn run(&self, adapter: &dyn SchemaAdapter, schema: &str) -> Result<Fetched, AdapterError> {
        let fetched = match self {
            FetchJob::Enums => Fetched::Enums(adapter.enums(schema)?),
            FetchJob::PrimaryKeys => Fetched::PrimaryKeys(adapter.primary_keys(schema)?),
            FetchJob::ForeignKeys => Fetched::ForeignKeys(adapter.foreign_keys(schema)?),
            FetchJob::TableComments => Fetched::TableComments(adapter.table_comments(schema)?),
            FetchJob::ColumnComments => Fetched::ColumnComments(adapter.column_comments(schema)?),
            FetchJob::Edges => Fetched::Edges(adapter.edges(schema)?),
            FetchJob::Table(table) => Fetched::Table(adapter.table(schema, table)?),
        };
        Ok(fetched)
    }
}

/// Builds the IR for one compilation.
pub struct IrBuilder<'a> {
    adapter: &'a dyn SchemaAdapter,
    options: &'a CompileOptions,
}

impl<'a> IrBuilder<'a> {
    pub fn new(adapter: &'a dyn SchemaAdapter, options: &'a CompileOptions) -> Self {
        Self { adapter, options }
    }

    /// Explicit schema, or the adapter's default.
    pub fn resolve_schema(&self) -> Result<String, CompileError> {
        match &self.options.schema {
            Some(schema) => Ok(schema.clone()),
            None => Ok(self.adapter.default_schema()?),
        }
    }

    /// Explicit allowlist, or every table the adapter reports. Never empty.
    pub fn resolve_tables(&self, schema: &str) -> Result<Vec<String>, CompileError> {
        let mut tables = if self.options.tables.is_empty() {
            self.adapter.table_names(schema)?
        } else {
            self.options.tables.clone()
        };
        tables.sort();
        tables.dedup();

        if tables.is_empty() {
            return Err(CompileError::MissingTableSet {
                schema: schema.to_string(),
            });
        }
        Ok(tables)
    }

    /// Number of worker threads for `jobs` fetches.
    fn worker_count(&self, jobs: usize) -> usize {
        let limit = self.adapter.max_concurrency().max(1);
        let configured = self.options.max_concurrency.unwrap_or(limit);
        configured.min(limit).min(jobs).max(1)
    }

    /// Fetch all metadata without merging it.
    pub fn fetch(&self) -> Result<SchemaSnapshot, CompileError> {
        let schema = self.resolve_schema()?;
        let tables = self.resolve_tables(&schema)?;

        let mut jobs = vec![
            FetchJob::Enums,
            FetchJob::PrimaryKeys,
            FetchJob::ForeignKeys,
            FetchJob::TableComments,
            FetchJob::ColumnComments,
            FetchJob::Edges,
        ];
        jobs.extend(tables.into_iter().map(FetchJob::Table));

        let workers = self.worker_count(jobs.len());
        info!(
            "Fetching {} metadata items from schema '{}' with {} worker(s)",
            jobs.len(),
            schema,
            workers
        );

        let mut snapshot = SchemaSnapshot::new(self.adapter.data_source(), schema.clone());
        for fetched in run_jobs(self.adapter, &schema, &jobs, workers)? {
            match fetched {
                Fetched::Enums(v) => snapshot.enums = v,
                Fetched::PrimaryKeys(v) => snapshot.primary_keys = v,
                Fetched::ForeignKeys(v) => snapshot.foreign_keys = v,
                Fetched::TableComments(v) => snapshot.table_comments = v,
                Fetched::ColumnComments(v) => snapshot.column_comments = v,
                Fetched::Edges(v) => snapshot.edges = v,
                Fetched::Table(table) => snapshot.tables.push(table),
            }
        }
        Ok(snapshot)
    }

    /// Fetch and merge.
    pub fn build(&self) -> Result<BuildContext, CompileError> {
        let snapshot = self.fetch()?;
        merge(snapshot, self.options)
    }
}

/// Run jobs on at most `workers` threads.
///
/// Workers claim jobs in index order and stop claiming once any job fails.
/// Results come back in job order; the first failure in job order is returned.
fn run_jobs(
    adapter: &dyn SchemaAdapter,
    schema: &str,
    jobs: &[FetchJob],
    workers: usize,
) -> Result<Vec<Fetched>, AdapterError> {
    let next = AtomicUsize::new(0);
    let failed = AtomicBool::new(false);
    let slots: Vec<Mutex<Option<Result<Fetched, AdapterError>>>> =
        jobs.iter().map(|_| Mutex::new(None)).collect();

    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| {
                while !failed.load(Ordering::SeqCst) {
                    let index = next.fetch_add(1, Ordering::SeqCst);
                    let Some(job) = jobs.get(index) else {
                        break;
                    };
                    let result = job.run(adapter, schema);
                    if result.is_err() {
                        failed.store(true, Ordering::SeqCst);
                    }
                    if let Ok(mut slot) = slots[index].lock() {
                        *slot = Some(result);
                    }
                }
            });
        }
    });

    let mut fetched = Vec::with_capacity(jobs.len());
    for slot in slots {
        match slot.into_inner().ok().flatten() {
            Some(Ok(value)) => fetched.push(value),
            Some(Err(err)) => return Err(err),
            // Only jobs after a failure are never claimed
            None => {}
        }
    }
    Ok(fetched)
}

fn check_unique_properties(schema: &str, owner: &str, properties: &[PropertyDefinition]) -> Result<(), CompileError> {
    let mut seen = BTreeSet::new();
    for property in properties {
        if !seen.insert(property.name.as_str()) {
            return Err(CompileError::DuplicateProperty {
                schema: schema.to_string(),
                entity: owner.to_string(),
                property: property.name.clone(),
            });
        }
    }
    Ok(())
}

/// Merge fetched metadata into a build context.
///
/// Entities, edges, enums and foreign keys are sorted; foreign keys and edges
/// whose ends are not part of the compilation are dropped.
pub fn merge(snapshot: SchemaSnapshot, options: &CompileOptions) -> Result<BuildContext, CompileError> {
    let SchemaSnapshot {
        data_source,
        schema,
        tables,
        edges,
        mut enums,
        primary_keys,
        foreign_keys,
        table_comments,
        column_comments,
    } = snapshot;

    let mut keys: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for pk in &primary_keys {
        keys.entry(pk.table.as_str()).or_default().insert(pk.column.as_str());
    }

    let mut entities = Vec::with_capacity(tables.len());
    for mut table in tables {
        check_unique_properties(&schema, &table.name, &table.properties)?;
        if let Some(columns) = keys.get(table.name.as_str()) {
            for property in &mut table.properties {
                if columns.contains(property.name.as_str()) {
                    property.is_primary_key = true;
                }
            }
        }
        entities.push(table);
    }
    entities.sort_by(|a, b| a.name.cmp(&b.name));
    entities.dedup_by(|a, b| a.name == b.name);

    let entity_names: BTreeSet<&str> = entities.iter().map(|e| e.name.as_str()).collect();
    let has_column = |table: &str, column: &str| {
        entities
            .iter()
            .find(|e| e.name == table)
            .is_some_and(|e| e.property(column).is_some())
    };

    let mut kept_edges = Vec::with_capacity(edges.len());
    for edge in edges {
        if !entity_names.contains(edge.source.as_str()) || !entity_names.contains(edge.target.as_str()) {
            debug!(
                "Dropping edge {} ({} -> {}): endpoint not in compilation",
                edge.name, edge.source, edge.target
            );
            continue;
        }
        check_unique_properties(&schema, &edge.name, &edge.properties)?;
        kept_edges.push(edge);
    }
    kept_edges.sort_by(|a, b| {
        (a.name.as_str(), a.source.as_str(), a.target.as_str())
            .cmp(&(b.name.as_str(), b.source.as_str(), b.target.as_str()))
    });
    kept_edges.dedup_by(|a, b| a.name == b.name && a.source == b.source && a.target == b.target);

    enums.sort();
    enums.dedup_by(|a, b| a.name == b.name && a.values == b.values);

    let mut kept_keys: Vec<ForeignKeyDefinition> = foreign_keys
        .into_iter()
        .filter(|fk| {
            let resolved = has_column(&fk.source_table, &fk.source_column)
                && has_column(&fk.target_table, &fk.target_column);
            if !resolved {
                debug!(
                    "Dropping dangling foreign key {}.{} -> {}.{}",
                    fk.source_table, fk.source_column, fk.target_table, fk.target_column
                );
            }
            resolved
        })
        .collect();
    kept_keys.sort();
    kept_keys.dedup();

    let table_comments: BTreeMap<String, String> = table_comments
        .into_iter()
        .filter(|c| entity_names.contains(c.table.as_str()))
        .map(|c| (c.table, c.comment))
        .collect();

    let mut columns: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    for comment in column_comments {
        if entity_names.contains(comment.table.as_str()) {
            columns.entry(comment.table).or_default().insert(comment.column, comment.comment);
        }
    }

    info!(
        "Built IR for schema '{}': {} entities, {} edges, {} enums, {} foreign keys",
        schema,
        entities.len(),
        kept_edges.len(),
        enums.len(),
        kept_keys.len()
    );

    Ok(BuildContext {
        schema,
        data_source,
        options: options.clone(),
        entities,
        edges: kept_edges,
        enums,
        foreign_keys: kept_keys,
        table_comments,
        column_comments: columns,
        imports: options.imports.clone(),
    })
}
