//! Intermediate representation of an introspected schema.

mod builder;
mod definition;

pub use builder::{merge, IrBuilder};
pub use definition::{
    BuildContext, ColumnComment, DataSource, EdgeDefinition, EntityDefinition, EnumDefinition,
    ForeignKeyDefinition, PrimaryKeyDefinition, PropertyDefinition, TableComment,
};
