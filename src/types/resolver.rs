//! Maps raw source type names to a backend's type vocabulary.
//!
//! Resolution order: static table, then enum definitions, then the backend's
//! fallback type (or `None` when strict). Wrapping is always scalar, then
//! array, then nullable, whatever the backend.

use std::sync::LazyLock;

use log::warn;
use regex::Regex;
use serde::Serialize;

use super::typemap::{self, Vocabulary};
use crate::backends::BackendId;
use crate::error::CompileError;
use crate::ir::{BuildContext, DataSource, EnumDefinition, PropertyDefinition};

static TYPE_PARAMS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\([^)]*\)").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Array and nullability flags of a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Cardinality {
    pub is_array: bool,
    pub is_nullable: bool,
}

impl Cardinality {
    pub const SCALAR: Cardinality = Cardinality {
        is_array: false,
        is_nullable: false,
    };

    pub fn of(property: &PropertyDefinition) -> Self {
        Self {
            is_array: property.is_array,
            is_nullable: property.is_nullable,
        }
    }

    /// Same array-ness, never nullable.
    pub fn non_null(self) -> Self {
        Self {
            is_nullable: false,
            ..self
        }
    }
}

/// Where a resolved type came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeOrigin {
    /// Found in the static table
    Mapped,
    /// Refers to the named source enum
    Enum(String),
    /// No mapping; generic type emitted
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResolvedType {
    /// Fully wrapped target type
    pub name: String,
    /// Target type before array/nullable wrapping
    pub scalar: String,
    pub origin: TypeOrigin,
}

/// A raw type after case-folding and parameter stripping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedType {
    pub name: String,
    pub is_array: bool,
}

/// Normalize a raw type name: trim, case-fold, drop `(..)` parameters, and
/// turn a trailing `[]` into an array flag.
pub fn normalize(raw_type: &str) -> NormalizedType {
    let lowered = raw_type.trim().to_ascii_lowercase();
    let (base, is_array) = match lowered.strip_suffix("[]") {
        Some(base) => (base.to_string(), true),
        None => (lowered, false),
    };
    let stripped = TYPE_PARAMS.replace_all(&base, "");
    let name = WHITESPACE.replace_all(stripped.trim(), " ").into_owned();
    NormalizedType { name, is_array }
}

/// Resolves raw types for one `(data source, backend)` pair.
///
/// Holds only borrowed, immutable inputs; the same call always yields the same
/// result.
#[derive(Debug, Clone, Copy)]
pub struct TypeResolver<'a> {
    data_source: DataSource,
    backend: BackendId,
    schema: &'a str,
    enums: &'a [EnumDefinition],
    throw_on_missing_type: bool,
}

impl<'a> TypeResolver<'a> {
    pub fn new(
        data_source: DataSource,
        backend: BackendId,
        schema: &'a str,
        enums: &'a [EnumDefinition],
        throw_on_missing_type: bool,
    ) -> Self {
        Self {
            data_source,
            backend,
            schema,
            enums,
            throw_on_missing_type,
        }
    }

    /// Resolver configured from a build context.
    pub fn for_context(ctx: &'a BuildContext, backend: BackendId) -> Self {
        Self::new(
            ctx.data_source,
            backend,
            &ctx.schema,
            &ctx.enums,
            ctx.options.throw_on_missing_type,
        )
    }

    pub fn backend(&self) -> BackendId {
        self.backend
    }

    fn vocabulary(&self) -> Vocabulary {
        self.backend.vocabulary()
    }

    /// Resolve a raw type.
    ///
    /// Returns `None` only when the type is unmapped and the resolver is strict.
    pub fn resolve(&self, raw_type: &str, cardinality: Cardinality) -> Option<ResolvedType> {
        let vocabulary = self.vocabulary();
        let normalized = normalize(raw_type);

        let (scalar, origin) = if let Some(mapped) = typemap::lookup(self.data_source, vocabulary, &normalized.name) {
            (mapped.to_string(), TypeOrigin::Mapped)
        } else if let Some(def) = self.find_enum(&normalized.name) {
            (vocabulary.enum_reference(&def.name), TypeOrigin::Enum(def.name.clone()))
        } else if self.throw_on_missing_type {
            return None;
        } else {
            (vocabulary.fallback().to_string(), TypeOrigin::Fallback)
        };

        let mut name = scalar.clone();
        if cardinality.is_array || normalized.is_array {
            name = vocabulary.wrap_array(&name);
        }
        if cardinality.is_nullable {
            name = vocabulary.wrap_nullable(&name);
        }

        Some(ResolvedType { name, scalar, origin })
    }

    /// Resolve a property of `owner`, attaching column context to failures and
    /// logging fallbacks.
    pub fn resolve_property(&self, owner: &str, property: &PropertyDefinition) -> Result<ResolvedType, CompileError> {
        let resolved = self
            .resolve(&property.raw_type, Cardinality::of(property))
            .ok_or_else(|| self.missing_mapping(owner, property))?;

        if resolved.origin == TypeOrigin::Fallback {
            warn!(
                "No {} mapping for {} type '{}' on {}.{}; using '{}'",
                self.backend, self.data_source, property.raw_type, owner, property.name, resolved.scalar
            );
        }
        Ok(resolved)
    }

    /// The error for a property whose raw type has no mapping.
    pub fn missing_mapping(&self, owner: &str, property: &PropertyDefinition) -> CompileError {
        CompileError::MissingTypeMapping {
            raw_type: property.raw_type.clone(),
            schema: self.schema.to_string(),
            data_source: self.data_source.to_string(),
            backend: self.backend.to_string(),
            entity: owner.to_string(),
            column: property.name.clone(),
        }
    }

    fn find_enum(&self, normalized: &str) -> Option<&'a EnumDefinition> {
        self.enums.iter().find(|e| e.name.eq_ignore_ascii_case(normalized))
    }
}
