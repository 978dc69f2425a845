//! Type resolution from raw source types to backend type vocabularies.

mod resolver;
pub mod typemap;

pub use resolver::{normalize, Cardinality, NormalizedType, ResolvedType, TypeOrigin, TypeResolver};
pub use typemap::Vocabulary;
