//! Shared fixtures for unit tests.

use crate::adapter::SchemaSnapshot;
use crate::config::CompileOptions;
use crate::ir::{
    BuildContext, DataSource, EntityDefinition, EnumDefinition, ForeignKeyDefinition, PropertyDefinition,
};

/// A Postgres build context in schema `public` holding only `entities`.
pub fn context_with(entities: Vec<EntityDefinition>) -> BuildContext {
    BuildContext {
        schema: "public".to_string(),
        data_source: DataSource::Postgres,
        options: CompileOptions::default(),
        entities,
        edges: Vec::new(),
        enums: Vec::new(),
        foreign_keys: Vec::new(),
        table_comments: Default::default(),
        column_comments: Default::default(),
        imports: Vec::new(),
    }
}

/// Two related tables with an enum, keys and comments.
///
/// `users` is listed before `orders` so ordering is observable.
pub fn shop_snapshot() -> SchemaSnapshot {
    SchemaSnapshot::new(DataSource::Postgres, "public")
        .with_table(EntityDefinition::new(
            "users",
            vec![
                PropertyDefinition::new("id", "int4").with_default("nextval('users_id_seq'::regclass)"),
                PropertyDefinition::new("email", "varchar"),
                PropertyDefinition::new("name", "text").nullable(),
                PropertyDefinition::new("tags", "text").array().nullable(),
            ],
        ))
        .with_table(EntityDefinition::new(
            "orders",
            vec![
                PropertyDefinition::new("id", "int4"),
                PropertyDefinition::new("user_id", "int4"),
                PropertyDefinition::new("status", "order_status"),
                PropertyDefinition::new("total", "numeric(10,2)"),
                PropertyDefinition::new("created_at", "timestamptz").with_default("now()"),
            ],
        ))
        .with_enum(EnumDefinition::new("order_status", &["pending", "shipped"]))
        .with_primary_key("users", "id")
        .with_primary_key("orders", "id")
        .with_foreign_key(ForeignKeyDefinition::new("orders", "user_id", "users", "id"))
        .with_table_comment("users", "Registered customers")
        .with_column_comment("users", "email", "Login address")
}

/// [`shop_snapshot`] merged with default options.
pub fn shop_context() -> BuildContext {
    crate::ir::merge(shop_snapshot(), &CompileOptions::default()).expect("shop snapshot merges")
}
