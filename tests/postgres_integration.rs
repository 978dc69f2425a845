//! Integration tests against a live PostgreSQL instance.
//!
//! Run with: cargo test --features postgres-tests
//!
//! Prerequisites:
//! 1. A reachable PostgreSQL server
//! 2. Create test database: `createdb -U postgres schemagen_test`
//!
//! Each test creates its own schema and drops it afterwards.

#![cfg(feature = "postgres-tests")]

use std::error::Error;

use postgres::{Client, NoTls};
use serial_test::serial;

use schemagen::adapter::{PostgresAdapter, SchemaAdapter};
use schemagen::compile::compile;
use schemagen::config::{CompileOptions, PostgresConfig};
use schemagen::ir::IrBuilder;

/// Test connection string for PostgreSQL (local instance)
const PG_CONNECTION: &str = "host=localhost user=postgres dbname=schemagen_test";
const SCHEMA: &str = "schemagen_it";

const FIXTURE: &str = "
CREATE SCHEMA schemagen_it;
CREATE TYPE schemagen_it.user_status AS ENUM ('active', 'banned');
CREATE TABLE schemagen_it.users (
    id serial PRIMARY KEY,
    email text NOT NULL,
    status schemagen_it.user_status,
    tags text[]
);
COMMENT ON TABLE schemagen_it.users IS 'Registered accounts';
COMMENT ON COLUMN schemagen_it.users.email IS 'Login address';
CREATE TABLE schemagen_it.orders (
    id serial PRIMARY KEY,
    user_id integer NOT NULL REFERENCES schemagen_it.users (id),
    total numeric
);
";

/// Creates the fixture schema and drops it again on drop.
struct Fixture {
    client: Client,
}

impl Fixture {
    fn new() -> Result<Self, Box<dyn Error>> {
        let mut client = Client::connect(PG_CONNECTION, NoTls)?;
        client.batch_execute(&format!("DROP SCHEMA IF EXISTS {} CASCADE", SCHEMA))?;
        client.batch_execute(FIXTURE)?;
        Ok(Self { client })
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = self
            .client
            .batch_execute(&format!("DROP SCHEMA IF EXISTS {} CASCADE", SCHEMA));
    }
}

fn adapter() -> Result<PostgresAdapter, Box<dyn Error>> {
    let config = PostgresConfig {
        connection_string: Some(PG_CONNECTION.to_string()),
        host: None,
        user: None,
        database: None,
        port: 0,
        password: None,
        ssl: false,
        max_connections: 2,
    };
    Ok(PostgresAdapter::connect(&config)?)
}

fn options(backend: &str) -> CompileOptions {
    CompileOptions {
        schema: Some(SCHEMA.to_string()),
        backend: backend.to_string(),
        ..Default::default()
    }
}

#[test]
#[serial]
fn test_introspects_tables_keys_and_comments() -> Result<(), Box<dyn Error>> {
    let _fixture = Fixture::new()?;
    let adapter = adapter()?;

    let ctx = IrBuilder::new(&adapter, &options("json")).build()?;
    let names: Vec<&str> = ctx.entities.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["orders", "users"]);

    let users = ctx.entity("users").unwrap();
    assert!(users.property("id").unwrap().is_primary_key);
    assert!(!users.property("email").unwrap().is_nullable);
    assert!(users.property("status").unwrap().is_nullable);

    let tags = users.property("tags").unwrap();
    assert!(tags.is_array);
    assert_eq!(tags.raw_type, "text");

    assert_eq!(ctx.table_comment("users"), Some("Registered accounts"));
    assert_eq!(ctx.enums.len(), 1);
    assert_eq!(ctx.enums[0].values, vec!["active", "banned"]);

    assert_eq!(ctx.foreign_keys.len(), 1);
    assert_eq!(ctx.foreign_keys[0].source_table, "orders");
    assert_eq!(ctx.foreign_keys[0].target_table, "users");

    adapter.close()?;
    Ok(())
}

#[test]
#[serial]
fn test_compiles_typescript() -> Result<(), Box<dyn Error>> {
    let _fixture = Fixture::new()?;
    let adapter = adapter()?;

    let compilation = compile(&adapter, &options("typescript"))?;
    assert!(compilation.output.contains("export interface Users {"));
    assert!(compilation.output.contains("export interface Orders {"));
    assert!(compilation.output.contains("\"active\" | \"banned\""));

    adapter.close()?;
    Ok(())
}

#[test]
#[serial]
fn test_close_releases_connections() -> Result<(), Box<dyn Error>> {
    let adapter = adapter()?;
    assert!(adapter.is_ready());
    adapter.close()?;
    assert!(!adapter.is_ready());
    assert!(adapter.default_schema().is_err());
    Ok(())
}
