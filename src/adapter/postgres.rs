//! PostgreSQL catalog adapter.
//!
//! Reads `information_schema` and `pg_catalog` over a small pool of blocking
//! clients. Each client sits behind its own mutex; calls pick a client round
//! robin, so up to `max_connections` fetches run at once.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use log::{debug, info};
use postgres::types::ToSql;
use postgres::{Client, NoTls, Row};

use super::SchemaAdapter;
use crate::config::PostgresConfig;
use crate::error::AdapterError;
use crate::ir::{
    ColumnComment, DataSource, EntityDefinition, EnumDefinition, ForeignKeyDefinition,
    PrimaryKeyDefinition, PropertyDefinition, TableComment,
};

const DEFAULT_SCHEMA: &str = "SELECT current_schema()::text";

const TABLE_NAMES: &str = "\
SELECT table_name::text
FROM information_schema.tables
WHERE table_schema = $1 AND table_type = 'BASE TABLE'
ORDER BY table_name";

const ENUMS: &str = "\
SELECT t.typname::text, e.enumlabel::text
FROM pg_type t
JOIN pg_enum e ON e.enumtypid = t.oid
JOIN pg_namespace n ON n.oid = t.typnamespace
WHERE n.nspname = $1
ORDER BY t.typname, e.enumsortorder";

const PRIMARY_KEYS: &str = "\
SELECT c.relname::text, a.attname::text
FROM pg_constraint con
JOIN pg_class c ON c.oid = con.conrelid
JOIN pg_namespace n ON n.oid = c.relnamespace
JOIN pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = ANY (con.conkey)
WHERE con.contype = 'p' AND n.nspname = $1
ORDER BY c.relname, a.attnum";

const FOREIGN_KEYS: &str = "\
SELECT con.conname::text, src.relname::text, sa.attname::text, tgt.relname::text, ta.attname::text
FROM pg_constraint con
CROSS JOIN LATERAL unnest(con.conkey, con.confkey) AS k(src_attnum, tgt_attnum)
JOIN pg_class src ON src.oid = con.conrelid
JOIN pg_namespace n ON n.oid = src.relnamespace
JOIN pg_class tgt ON tgt.oid = con.confrelid
JOIN pg_attribute sa ON sa.attrelid = con.conrelid AND sa.attnum = k.src_attnum
JOIN pg_attribute ta ON ta.attrelid = con.confrelid AND ta.attnum = k.tgt_attnum
WHERE con.contype = 'f' AND n.nspname = $1
ORDER BY src.relname, sa.attname";

const TABLE_COMMENTS: &str = "\
SELECT c.relname::text, obj_description(c.oid, 'pg_class')::text
FROM pg_class c
JOIN pg_namespace n ON n.oid = c.relnamespace
WHERE n.nspname = $1
  AND c.relkind IN ('r', 'p')
  AND obj_description(c.oid, 'pg_class') IS NOT NULL
ORDER BY c.relname";

const COLUMN_COMMENTS: &str = "\
SELECT c.relname::text, a.attname::text, col_description(c.oid, a.attnum)::text
FROM pg_class c
JOIN pg_namespace n ON n.oid = c.relnamespace
JOIN pg_attribute a ON a.attrelid = c.oid
WHERE n.nspname = $1
  AND c.relkind IN ('r', 'p')
  AND a.attnum > 0
  AND NOT a.attisdropped
  AND col_description(c.oid, a.attnum) IS NOT NULL
ORDER BY c.relname, a.attnum";

const COLUMNS: &str = "\
SELECT column_name::text, data_type::text, udt_name::text, is_nullable::text, column_default::text
FROM information_schema.columns
WHERE table_schema = $1 AND table_name = $2
ORDER BY ordinal_position";

/// Adapter over a live PostgreSQL database.
pub struct PostgresAdapter {
    clients: Vec<Mutex<Option<Client>>>,
    next: AtomicUsize,
}

impl PostgresAdapter {
    /// Open `max_connections` clients (at least one).
    pub fn connect(config: &PostgresConfig) -> Result<Self, AdapterError> {
        let conn = config
            .build_connection_string()
            .map_err(|e| AdapterError::Connection { message: e.to_string() })?;

        let size = config.max_connections.max(1);
        let mut clients = Vec::with_capacity(size);
        for _ in 0..size {
            let client = Client::connect(&conn, NoTls).map_err(|e| AdapterError::Connection {
                message: e.to_string(),
            })?;
            clients.push(Mutex::new(Some(client)));
        }
        info!("Opened {} PostgreSQL connection(s)", size);

        Ok(Self {
            clients,
            next: AtomicUsize::new(0),
        })
    }

    fn query(&self, context: &str, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Vec<Row>, AdapterError> {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.clients.len();
        let mut guard = self.clients[index]
            .lock()
            .map_err(|e| AdapterError::query(context, format!("connection lock poisoned: {}", e)))?;
        let client = guard.as_mut().ok_or(AdapterError::Closed)?;
        debug!("{} on connection {}", context, index);
        client.query(sql, params).map_err(|e| AdapterError::query(context, e))
    }
}

fn text(row: &Row, idx: usize, context: &str) -> Result<String, AdapterError> {
    row.try_get::<_, String>(idx).map_err(|e| AdapterError::query(context, e))
}

fn optional_text(row: &Row, idx: usize, context: &str) -> Result<Option<String>, AdapterError> {
    row.try_get::<_, Option<String>>(idx)
        .map_err(|e| AdapterError::query(context, e))
}

/// Turn one `information_schema.columns` row into a property.
///
/// Arrays report `data_type = 'ARRAY'` and an element `udt_name` prefixed
/// with `_`.
fn column_property(
    name: String,
    data_type: &str,
    udt_name: &str,
    is_nullable: &str,
    default: Option<String>,
) -> PropertyDefinition {
    let is_array = data_type.eq_ignore_ascii_case("ARRAY");
    let raw_type = if is_array {
        udt_name.strip_prefix('_').unwrap_or(udt_name).to_string()
    } else {
        udt_name.to_string()
    };

    let mut property = PropertyDefinition::new(name, raw_type);
    property.is_array = is_array;
    property.is_nullable = is_nullable.eq_ignore_ascii_case("YES");
    if let Some(value) = default {
        property = property.with_default(value);
    }
    property
}

/// Collapse `(type, label)` rows, already ordered by type, into enums.
fn group_enum_labels(rows: Vec<(String, String)>) -> Vec<EnumDefinition> {
    let mut enums: Vec<EnumDefinition> = Vec::new();
    for (name, label) in rows {
        match enums.last_mut() {
            Some(last) if last.name == name => last.values.push(label),
            _ => enums.push(EnumDefinition {
                name,
                values: vec![label],
                column: None,
            }),
        }
    }
    enums
}

impl SchemaAdapter for PostgresAdapter {
    fn data_source(&self) -> DataSource {
        DataSource::Postgres
    }

    fn default_schema(&self) -> Result<String, AdapterError> {
        let context = "Default schema lookup";
        let rows = self.query(context, DEFAULT_SCHEMA, &[])?;
        match rows.first() {
            Some(row) => text(row, 0, context),
            None => Err(AdapterError::query(context, "no current schema")),
        }
    }

    fn table_names(&self, schema: &str) -> Result<Vec<String>, AdapterError> {
        let context = "Table listing";
        self.query(context, TABLE_NAMES, &[&schema])?
            .iter()
            .map(|row| text(row, 0, context))
            .collect()
    }

    fn enums(&self, schema: &str) -> Result<Vec<EnumDefinition>, AdapterError> {
        let context = "Enum fetch";
        let rows = self
            .query(context, ENUMS, &[&schema])?
            .iter()
            .map(|row| Ok((text(row, 0, context)?, text(row, 1, context)?)))
            .collect::<Result<Vec<_>, AdapterError>>()?;
        Ok(group_enum_labels(rows))
    }

    fn primary_keys(&self, schema: &str) -> Result<Vec<PrimaryKeyDefinition>, AdapterError> {
        let context = "Primary key fetch";
        self.query(context, PRIMARY_KEYS, &[&schema])?
            .iter()
            .map(|row| {
                Ok(PrimaryKeyDefinition {
                    table: text(row, 0, context)?,
                    column: text(row, 1, context)?,
                })
            })
            .collect()
    }

    fn foreign_keys(&self, schema: &str) -> Result<Vec<ForeignKeyDefinition>, AdapterError> {
        let context = "Foreign key fetch";
        self.query(context, FOREIGN_KEYS, &[&schema])?
            .iter()
            .map(|row| {
                let mut fk = ForeignKeyDefinition::new(
                    text(row, 1, context)?,
                    text(row, 2, context)?,
                    text(row, 3, context)?,
                    text(row, 4, context)?,
                );
                fk.constraint = Some(text(row, 0, context)?);
                Ok(fk)
            })
            .collect()
    }

    fn table_comments(&self, schema: &str) -> Result<Vec<TableComment>, AdapterError> {
        let context = "Table comment fetch";
        self.query(context, TABLE_COMMENTS, &[&schema])?
            .iter()
            .map(|row| {
                Ok(TableComment {
                    table: text(row, 0, context)?,
                    comment: text(row, 1, context)?,
                })
            })
            .collect()
    }

    fn column_comments(&self, schema: &str) -> Result<Vec<ColumnComment>, AdapterError> {
        let context = "Column comment fetch";
        self.query(context, COLUMN_COMMENTS, &[&schema])?
            .iter()
            .map(|row| {
                Ok(ColumnComment {
                    table: text(row, 0, context)?,
                    column: text(row, 1, context)?,
                    comment: text(row, 2, context)?,
                })
            })
            .collect()
    }

    fn table(&self, schema: &str, table: &str) -> Result<EntityDefinition, AdapterError> {
        let context = format!("Column fetch for {}.{}", schema, table);
        let rows = self.query(&context, COLUMNS, &[&schema, &table])?;
        if rows.is_empty() {
            return Err(AdapterError::TableNotFound {
                schema: schema.to_string(),
                table: table.to_string(),
            });
        }

        let properties = rows
            .iter()
            .map(|row| {
                Ok(column_property(
                    text(row, 0, &context)?,
                    &text(row, 1, &context)?,
                    &text(row, 2, &context)?,
                    &text(row, 3, &context)?,
                    optional_text(row, 4, &context)?,
                ))
            })
            .collect::<Result<Vec<_>, AdapterError>>()?;

        Ok(EntityDefinition::new(table, properties))
    }

    fn max_concurrency(&self) -> usize {
        self.clients.len()
    }

    fn is_ready(&self) -> bool {
        self.clients.iter().any(|slot| {
            slot.lock()
                .map(|client| client.as_ref().is_some_and(|c| !c.is_closed()))
                .unwrap_or(false)
        })
    }

    fn close(&self) -> Result<(), AdapterError> {
        for slot in &self.clients {
            let client = slot
                .lock()
                .map_err(|e| AdapterError::query("Close", format!("connection lock poisoned: {}", e)))?
                .take();
            if let Some(client) = client {
                client
                    .close()
                    .map_err(|e| AdapterError::query("Close", e))?;
            }
        }
        debug!("Closed PostgreSQL connections");
        Ok(())
    }
}
