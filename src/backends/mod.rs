//! Backend dispatch.
//!
//! The set of backends is closed: [`BackendId`] names every target and
//! [`BackendId::backend`] maps each one to its renderer with an exhaustive
//! match. Renderers implement [`Render`], which `enum_dispatch` forwards
//! through [`Backend`].
//!
//! # Adding a backend
//!
//! 1. Add a module with a unit struct implementing [`Render`]
//! 2. Add a variant to [`BackendId`] and [`Backend`]
//! 3. The compiler then points at every match that needs the new variant

mod cozo;
mod julia;
mod loader;
pub mod naming;
mod python;
mod structured;
mod typedb;
mod typescript;

pub use cozo::CozoBackend;
pub use julia::JuliaBackend;
pub use loader::LoaderBackend;
pub use python::PythonBackend;
pub use structured::{JsonBackend, ToonBackend};
pub use typedb::TypeDbBackend;
pub use typescript::TypeScriptBackend;

use std::fmt;
use std::str::FromStr;

use enum_dispatch::enum_dispatch;
use serde::Serialize;

use crate::coreference::Coreferences;
use crate::error::CompileError;
use crate::ir::{BuildContext, EdgeDefinition, PropertyDefinition};
use crate::types::{normalize, ResolvedType, TypeOrigin, TypeResolver, Vocabulary};
use naming::NameFormatters;

/// Identifier of a target format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendId {
    TypeScript,
    TypeDb,
    Julia,
    Python,
    Cozo,
    Loader,
    Json,
    Toon,
}

impl BackendId {
    pub const ALL: [BackendId; 8] = [
        BackendId::TypeScript,
        BackendId::TypeDb,
        BackendId::Julia,
        BackendId::Python,
        BackendId::Cozo,
        BackendId::Loader,
        BackendId::Json,
        BackendId::Toon,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BackendId::TypeScript => "typescript",
            BackendId::TypeDb => "typedb",
            BackendId::Julia => "julia",
            BackendId::Python => "python",
            BackendId::Cozo => "cozo",
            BackendId::Loader => "loader",
            BackendId::Json => "json",
            BackendId::Toon => "toon",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BackendId::TypeScript => "TypeScript interfaces and string-union enums",
            BackendId::TypeDb => "TypeQL schema with global attributes and relations",
            BackendId::Julia => "Julia @enum and Base.@kwdef structs",
            BackendId::Python => "Python Enum classes and dataclasses",
            BackendId::Cozo => "Cozo :create relation DDL",
            BackendId::Loader => "TypeDB data loader configuration (JSON)",
            BackendId::Json => "Filtered schema with resolved types (JSON)",
            BackendId::Toon => "Filtered schema with resolved types (toon)",
        }
    }

    /// Type system the backend's types are drawn from.
    pub fn vocabulary(&self) -> Vocabulary {
        match self {
            BackendId::TypeScript => Vocabulary::TypeScript,
            BackendId::TypeDb | BackendId::Loader => Vocabulary::TypeQl,
            BackendId::Julia => Vocabulary::Julia,
            BackendId::Python => Vocabulary::Python,
            BackendId::Cozo => Vocabulary::Cozo,
            BackendId::Json | BackendId::Toon => Vocabulary::Structured,
        }
    }

    pub fn backend(&self) -> Backend {
        match self {
            BackendId::TypeScript => TypeScriptBackend.into(),
            BackendId::TypeDb => TypeDbBackend.into(),
            BackendId::Julia => JuliaBackend.into(),
            BackendId::Python => PythonBackend.into(),
            BackendId::Cozo => CozoBackend.into(),
            BackendId::Loader => LoaderBackend.into(),
            BackendId::Json => JsonBackend.into(),
            BackendId::Toon => ToonBackend.into(),
        }
    }

    /// Comma separated list of every identifier.
    pub fn valid_names() -> String {
        Self::ALL.iter().map(|b| b.name()).collect::<Vec<_>>().join(", ")
    }
}

impl FromStr for BackendId {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let requested = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|b| b.name() == requested)
            .ok_or_else(|| CompileError::InvalidBackend {
                requested: s.to_string(),
                valid: Self::valid_names(),
            })
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A renderer for one target format.
///
/// Rendering reads the IR and returns text; it never writes anywhere.
#[enum_dispatch]
pub trait Render {
    fn id(&self) -> BackendId;

    /// Casing used when the configuration does not override a name kind.
    fn default_formatters(&self) -> NameFormatters;

    fn render(&self, ctx: &BuildContext, coreferences: &Coreferences) -> Result<String, CompileError>;
}

#[enum_dispatch(Render)]
#[derive(Debug, Clone, Copy)]
pub enum Backend {
    TypeScriptBackend,
    TypeDbBackend,
    JuliaBackend,
    PythonBackend,
    CozoBackend,
    LoaderBackend,
    JsonBackend,
    ToonBackend,
}

/// What every renderer needs: the IR, a resolver and the effective casing.
pub(crate) struct Scope<'a> {
    pub ctx: &'a BuildContext,
    pub resolver: TypeResolver<'a>,
    pub names: NameFormatters,
}

impl<'a> Scope<'a> {
    pub fn new(ctx: &'a BuildContext, backend: &impl Render) -> Self {
        Self {
            ctx,
            resolver: TypeResolver::for_context(ctx, backend.id()),
            names: backend
                .default_formatters()
                .with_overrides(&ctx.options.formatters),
        }
    }

    pub fn resolve(&self, owner: &str, property: &PropertyDefinition) -> Result<ResolvedType, CompileError> {
        self.resolver.resolve_property(owner, property)
    }

    /// Resolved type of a property, with enum references renamed by the enum
    /// formatter so they match the declarations the backend emits.
    pub fn property_type(&self, owner: &str, property: &PropertyDefinition) -> Result<String, CompileError> {
        let resolved = self.resolve(owner, property)?;
        let TypeOrigin::Enum(enum_name) = &resolved.origin else {
            return Ok(resolved.name);
        };

        let vocabulary = self.resolver.backend().vocabulary();
        if !declares_enums(vocabulary) {
            return Ok(resolved.name);
        }
        let mut name = self.names.enum_type(enum_name);
        if property.is_array || normalize(&property.raw_type).is_array {
            name = vocabulary.wrap_array(&name);
        }
        if property.is_nullable {
            name = vocabulary.wrap_nullable(&name);
        }
        Ok(name)
    }

    /// Source name of an edge type, before casing.
    pub fn edge_name(&self, edge: &EdgeDefinition) -> String {
        self.ctx.edge_key(edge).into_owned()
    }
}

/// Vocabularies that declare enums as named types.
fn declares_enums(vocabulary: Vocabulary) -> bool {
    matches!(vocabulary, Vocabulary::TypeScript | Vocabulary::Julia | Vocabulary::Python)
}

/// Render the IR with the named backend.
pub fn render(backend: BackendId, ctx: &BuildContext, coreferences: &Coreferences) -> Result<String, CompileError> {
    backend.backend().render(ctx, coreferences)
}
