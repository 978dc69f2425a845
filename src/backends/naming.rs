//! Name casing policies applied by backends.
//!
//! Each backend has a default casing per name kind; configuration can override
//! any of them. Formatting never touches the IR, only the rendered text.

use heck::{ToKebabCase, ToLowerCamelCase, ToPascalCase, ToShoutySnakeCase, ToSnakeCase};
use serde::{Deserialize, Serialize};

/// A casing convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Casing {
    /// Keep the source name as-is
    Preserve,
    /// lowerCamelCase
    Camel,
    /// UpperCamelCase
    Pascal,
    /// snake_case
    Snake,
    /// SCREAMING_SNAKE_CASE
    ScreamingSnake,
    /// kebab-case
    Kebab,
}

impl Casing {
    /// Name as written in the configuration file.
    pub fn name(&self) -> &'static str {
        match self {
            Casing::Preserve => "preserve",
            Casing::Camel => "camel",
            Casing::Pascal => "pascal",
            Casing::Snake => "snake",
            Casing::ScreamingSnake => "screaming_snake",
            Casing::Kebab => "kebab",
        }
    }

    pub fn apply(&self, name: &str) -> String {
        match self {
            Casing::Preserve => name.to_string(),
            Casing::Camel => name.to_lower_camel_case(),
            Casing::Pascal => name.to_pascal_case(),
            Casing::Snake => name.to_snake_case(),
            Casing::ScreamingSnake => name.to_shouty_snake_case(),
            Casing::Kebab => name.to_kebab_case(),
        }
    }
}

/// Per-kind overrides as they appear in the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatterConfig {
    pub entity: Option<Casing>,
    pub attribute: Option<Casing>,
    pub relation: Option<Casing>,
    #[serde(rename = "enum")]
    pub enum_type: Option<Casing>,
}

/// Effective casing for every name kind of one backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameFormatters {
    pub entity: Casing,
    pub attribute: Casing,
    pub relation: Casing,
    pub enum_type: Casing,
}

impl NameFormatters {
    pub const fn uniform(casing: Casing) -> Self {
        Self {
            entity: casing,
            attribute: casing,
            relation: casing,
            enum_type: casing,
        }
    }

    /// Apply configured overrides on top of backend defaults.
    pub fn with_overrides(self, config: &FormatterConfig) -> Self {
        Self {
            entity: config.entity.unwrap_or(self.entity),
            attribute: config.attribute.unwrap_or(self.attribute),
            relation: config.relation.unwrap_or(self.relation),
            enum_type: config.enum_type.unwrap_or(self.enum_type),
        }
    }

    pub fn entity(&self, name: &str) -> String {
        self.entity.apply(name)
    }

    pub fn attribute(&self, name: &str) -> String {
        self.attribute.apply(name)
    }

    pub fn relation(&self, name: &str) -> String {
        self.relation.apply(name)
    }

    pub fn enum_type(&self, name: &str) -> String {
        self.enum_type.apply(name)
    }
}
