//! Apache AGE graph adapter.
//!
//! A graph has no declared column types, so node and edge properties are
//! inferred from a bounded sample of each label. The graph name plays the role
//! of the schema.

use std::collections::BTreeMap;
use std::sync::Mutex;

use apache_age::sync::{AgeClient, Client};
use apache_age::NoTls;
use log::{debug, info, warn};
use postgres::SimpleQueryMessage;
use serde_json::{Map, Value};

use super::escape::{cypher_identifier, sql_literal};
use super::SchemaAdapter;
use crate::config::AgeConfig;
use crate::error::AdapterError;
use crate::ir::{
    ColumnComment, DataSource, EdgeDefinition, EntityDefinition, EnumDefinition, ForeignKeyDefinition,
    PrimaryKeyDefinition, PropertyDefinition, TableComment,
};

/// AGE keeps its default labels under this prefix.
const INTERNAL_LABEL_PREFIX: &str = "_ag_label";

/// Adapter over one AGE graph.
pub struct AgeAdapter {
    client: Mutex<Option<Client>>,
    graph: String,
    sample_size: usize,
}

impl AgeAdapter {
    /// Connect and check that the configured graph exists.
    pub fn connect(config: &AgeConfig) -> Result<Self, AdapterError> {
        let conn = config
            .connection
            .build_connection_string()
            .map_err(|e| AdapterError::Connection { message: e.to_string() })?;
        let client = Client::connect_age(&conn, NoTls).map_err(|e| AdapterError::Connection {
            message: e.to_string(),
        })?;

        let adapter = Self {
            client: Mutex::new(Some(client)),
            graph: config.graph_name.clone(),
            sample_size: config.sample_size.max(1),
        };

        let exists = adapter.rows(
            "Graph lookup",
            &format!(
                "SELECT name::text FROM ag_catalog.ag_graph WHERE name = {}",
                sql_literal(&adapter.graph)
            ),
        )?;
        if exists.is_empty() {
            return Err(AdapterError::GraphNotFound {
                graph: adapter.graph.clone(),
            });
        }
        info!("Connected to AGE graph '{}'", adapter.graph);
        Ok(adapter)
    }

    /// Run a simple query and return its rows as text columns.
    fn rows(&self, context: &str, sql: &str) -> Result<Vec<Vec<Option<String>>>, AdapterError> {
        let mut guard = self
            .client
            .lock()
            .map_err(|e| AdapterError::query(context, format!("connection lock poisoned: {}", e)))?;
        let client = guard.as_mut().ok_or(AdapterError::Closed)?;
        debug!("{}: {}", context, sql);

        let messages = client.simple_query(sql).map_err(|e| AdapterError::query(context, e))?;
        Ok(messages
            .iter()
            .filter_map(|message| match message {
                SimpleQueryMessage::Row(row) => {
                    Some((0..row.len()).map(|i| row.get(i).map(str::to_string)).collect())
                }
                _ => None,
            })
            .collect())
    }

    /// Labels of the given kind (`v` or `e`), without AGE's internal ones.
    fn labels(&self, graph: &str, kind: &str) -> Result<Vec<String>, AdapterError> {
        let sql = format!(
            "SELECT l.name::text FROM ag_catalog.ag_label l \
             JOIN ag_catalog.ag_graph g ON g.graphid = l.graph \
             WHERE g.name = {} AND l.kind = {} ORDER BY l.name",
            sql_literal(graph),
            sql_literal(kind)
        );
        Ok(self
            .rows("Label listing", &sql)?
            .into_iter()
            .filter_map(|row| row.into_iter().next().flatten())
            .filter(|name| !name.starts_with(INTERNAL_LABEL_PREFIX))
            .collect())
    }

    fn sample_nodes(&self, graph: &str, label: &str) -> Result<Vec<Map<String, Value>>, AdapterError> {
        let sql = format!(
            "SELECT * FROM cypher({}, $$ MATCH (n:{}) RETURN properties(n) LIMIT {} $$) AS (props agtype)",
            sql_literal(graph),
            cypher_identifier(label),
            self.sample_size
        );
        let context = format!("Property sampling for {}", label);
        Ok(self
            .rows(&context, &sql)?
            .into_iter()
            .filter_map(|row| row.into_iter().next().flatten())
            .filter_map(|text| parse_properties(&text))
            .collect())
    }

    /// `(source label, target label, properties)` for sampled edges of a label.
    fn sample_edges(
        &self,
        graph: &str,
        label: &str,
    ) -> Result<Vec<(String, String, Map<String, Value>)>, AdapterError> {
        let sql = format!(
            "SELECT * FROM cypher({}, $$ MATCH (a)-[r:{}]->(b) RETURN label(a), label(b), properties(r) LIMIT {} $$) \
             AS (source agtype, target agtype, props agtype)",
            sql_literal(graph),
            cypher_identifier(label),
            self.sample_size
        );
        let context = format!("Edge sampling for {}", label);
        Ok(self
            .rows(&context, &sql)?
            .into_iter()
            .filter_map(|row| {
                let mut columns = row.into_iter();
                let source = parse_label(&columns.next().flatten()?);
                let target = parse_label(&columns.next().flatten()?);
                let props = parse_properties(&columns.next().flatten()?)?;
                Some((source, target, props))
            })
            .collect())
    }
}

/// Parse an agtype map. Values JSON cannot express are skipped.
fn parse_properties(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(e) => {
            warn!("Skipping unparsable property sample {}: {}", text, e);
            None
        }
    }
}

/// agtype strings come back quoted.
fn parse_label(text: &str) -> String {
    serde_json::from_str::<String>(text).unwrap_or_else(|_| text.trim_matches('"').to_string())
}

fn scalar_kind(value: &Value) -> Option<&'static str> {
    match value {
        Value::Null => None,
        Value::Bool(_) => Some("boolean"),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some("integer"),
        Value::Number(_) => Some("float"),
        Value::String(_) => Some("string"),
        Value::Object(_) => Some("map"),
        Value::Array(_) => Some("list"),
    }
}

#[derive(Default)]
struct Observed {
    kinds: Vec<&'static str>,
    seen: usize,
    saw_null: bool,
    is_array: bool,
}

impl Observed {
    fn record(&mut self, value: &Value) {
        self.seen += 1;
        match value {
            Value::Null => self.saw_null = true,
            Value::Array(items) => {
                self.is_array = true;
                for item in items {
                    self.push_kind(scalar_kind(item));
                }
            }
            other => self.push_kind(scalar_kind(other)),
        }
    }

    fn push_kind(&mut self, kind: Option<&'static str>) {
        if let Some(kind) = kind {
            if !self.kinds.contains(&kind) {
                self.kinds.push(kind);
            }
        }
    }

    fn raw_type(&self) -> &'static str {
        let mut kinds = self.kinds.clone();
        kinds.sort();
        match kinds.as_slice() {
            [single] => *single,
            ["float", "integer"] => "float",
            _ => "any",
        }
    }
}

/// Infer property definitions from sampled property maps.
///
/// A property missing from some samples, or null in any, is nullable. Mixed
/// integer and float samples widen to float; any other mix is `any`.
fn infer_properties(samples: &[Map<String, Value>]) -> Vec<PropertyDefinition> {
    let mut observed: BTreeMap<&str, Observed> = BTreeMap::new();
    for sample in samples {
        for (key, value) in sample {
            observed.entry(key.as_str()).or_default().record(value);
        }
    }

    observed
        .into_iter()
        .map(|(name, seen)| {
            let mut property = PropertyDefinition::new(name, seen.raw_type());
            property.is_array = seen.is_array;
            property.is_nullable = seen.saw_null || seen.seen < samples.len();
            property
        })
        .collect()
}

impl SchemaAdapter for AgeAdapter {
    fn data_source(&self) -> DataSource {
        DataSource::Age
    }

    fn default_schema(&self) -> Result<String, AdapterError> {
        Ok(self.graph.clone())
    }

    fn table_names(&self, schema: &str) -> Result<Vec<String>, AdapterError> {
        self.labels(schema, "v")
    }

    fn enums(&self, _schema: &str) -> Result<Vec<EnumDefinition>, AdapterError> {
        Ok(Vec::new())
    }

    fn primary_keys(&self, _schema: &str) -> Result<Vec<PrimaryKeyDefinition>, AdapterError> {
        Ok(Vec::new())
    }

    fn foreign_keys(&self, _schema: &str) -> Result<Vec<ForeignKeyDefinition>, AdapterError> {
        Ok(Vec::new())
    }

    fn table_comments(&self, _schema: &str) -> Result<Vec<TableComment>, AdapterError> {
        Ok(Vec::new())
    }

    fn column_comments(&self, _schema: &str) -> Result<Vec<ColumnComment>, AdapterError> {
        Ok(Vec::new())
    }

    fn table(&self, schema: &str, table: &str) -> Result<EntityDefinition, AdapterError> {
        if !self.labels(schema, "v")?.iter().any(|l| l == table) {
            return Err(AdapterError::TableNotFound {
                schema: schema.to_string(),
                table: table.to_string(),
            });
        }
        let samples = self.sample_nodes(schema, table)?;
        debug!("Sampled {} {} node(s)", samples.len(), table);
        Ok(EntityDefinition::new(table, infer_properties(&samples)))
    }

    /// One edge definition per `(label, source label, target label)` observed.
    fn edges(&self, schema: &str) -> Result<Vec<EdgeDefinition>, AdapterError> {
        let mut edges = Vec::new();
        for label in self.labels(schema, "e")? {
            let mut by_endpoints: BTreeMap<(String, String), Vec<Map<String, Value>>> = BTreeMap::new();
            for (source, target, props) in self.sample_edges(schema, &label)? {
                by_endpoints.entry((source, target)).or_default().push(props);
            }
            for ((source, target), samples) in by_endpoints {
                edges.push(EdgeDefinition::new(
                    label.clone(),
                    source,
                    target,
                    infer_properties(&samples),
                ));
            }
        }
        Ok(edges)
    }

    fn is_ready(&self) -> bool {
        self.client
            .lock()
            .map(|client| client.as_ref().is_some_and(|c| !c.is_closed()))
            .unwrap_or(false)
    }

    fn close(&self) -> Result<(), AdapterError> {
        let client = self
            .client
            .lock()
            .map_err(|e| AdapterError::query("Close", format!("connection lock poisoned: {}", e)))?
            .take();
        if let Some(client) = client {
            client.close().map_err(|e| AdapterError::query("Close", e))?;
        }
        Ok(())
    }
}
