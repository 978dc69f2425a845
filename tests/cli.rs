//! Command line runs against a snapshot source configured on disk.

use std::fs;
use std::path::Path;

use clap::Parser;
use rstest::rstest;
use serial_test::serial;
use tempfile::TempDir;

use schemagen::adapter::SchemaSnapshot;
use schemagen::cli::Args;
use schemagen::ir::{DataSource, EntityDefinition, PropertyDefinition};

/// A workspace holding `shop.json` and a `.schemagen.json` pointing at it.
fn workspace(compile: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = SchemaSnapshot::new(DataSource::Postgres, "public")
        .with_table(EntityDefinition::new(
            "users",
            vec![PropertyDefinition::new("id", "int4"), PropertyDefinition::new("email", "text")],
        ))
        .with_table(EntityDefinition::new(
            "accounts",
            vec![PropertyDefinition::new("id", "varchar")],
        ))
        .with_primary_key("users", "id");
    fs::write(dir.path().join("shop.json"), snapshot.to_json().unwrap()).unwrap();

    let config = format!(
        r#"{{ "source": {{ "type": "snapshot", "path": {} }}, "compile": {} }}"#,
        serde_json::to_string(&dir.path().join("shop.json")).unwrap(),
        compile
    );
    fs::write(dir.path().join(".schemagen.json"), config).unwrap();
    dir
}

fn run(dir: &Path, argv: &[&str]) -> Result<String, Box<dyn std::error::Error>> {
    let args = Args::try_parse_from(argv)?;
    args.command.run(&dir.join(&args.config), args.format)
}

#[rstest]
fn test_generate_prints_document() {
    let dir = workspace(r#"{ "backend": "cozo" }"#);
    let output = run(dir.path(), &["schemagen", "generate", "-t", "users"]).unwrap();
    assert!(output.starts_with(":create users {"));
}

#[rstest]
fn test_backend_flag_overrides_config() {
    let dir = workspace(r#"{ "backend": "cozo" }"#);
    let output = run(dir.path(), &["schemagen", "generate", "-b", "typescript", "-t", "users"]).unwrap();
    assert!(output.contains("export interface Users {"));
}

#[rstest]
fn test_generate_writes_file() {
    let dir = workspace("{}");
    let out = dir.path().join("schema.tql");
    let out_arg = out.to_string_lossy().to_string();
    let summary = run(dir.path(), &["schemagen", "generate", "-b", "typedb", "--out", &out_arg]).unwrap();

    assert!(summary.contains("Wrote typedb output for schema 'public'"));
    assert!(summary.contains("conflicting types for 'id' in accounts, users (dropped)"));
    assert!(fs::read_to_string(&out).unwrap().starts_with("define\n"));
}

#[rstest]
fn test_coreferences_json() {
    let dir = workspace("{}");
    let output = run(dir.path(), &["schemagen", "coreferences", "-b", "typedb", "-o", "json"]).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["error"]["id"][0]["table_name"], "accounts");
}

#[rstest]
fn test_snapshot_round_trip() {
    let dir = workspace("{}");
    let output = run(dir.path(), &["schemagen", "snapshot"]).unwrap();
    let snapshot: SchemaSnapshot = serde_json::from_str(&output).unwrap();
    assert_eq!(snapshot.tables.len(), 2);
    assert_eq!(snapshot.primary_keys.len(), 1);
}

#[rstest]
#[serial]
fn test_backends_needs_no_config() {
    let dir = tempfile::tempdir().unwrap();
    let previous = std::env::current_dir().unwrap();
    std::env::set_current_dir(dir.path()).unwrap();

    let args = Args::try_parse_from(["schemagen", "backends"]).unwrap();
    let result = args.command.run(&args.config, args.format);

    std::env::set_current_dir(previous).unwrap();
    assert!(result.unwrap().contains("typescript"));
}

#[rstest]
#[serial]
fn test_missing_default_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let previous = std::env::current_dir().unwrap();
    std::env::set_current_dir(dir.path()).unwrap();

    let args = Args::try_parse_from(["schemagen", "generate"]).unwrap();
    let result = args.command.run(&args.config, args.format);

    std::env::set_current_dir(previous).unwrap();
    let message = result.unwrap_err().to_string();
    assert!(message.contains("Configuration file not found: .schemagen.json"));
}

#[rstest]
fn test_unknown_subcommand() {
    let dir = workspace("{}");
    let err = run(dir.path(), &["schemagen", "diff"]).unwrap_err();
    assert_eq!(err.to_string(), "Unknown command: diff");
}
