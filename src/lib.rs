//! schemagen library - schema introspection compiler
//!
//! Reads the metadata of a relational or graph data source, builds a
//! source-agnostic intermediate representation, checks column names reused
//! across tables for type conflicts, and renders the result with one of a
//! closed set of backends.
//!
//! ```no_run
//! use schemagen::adapter::SnapshotAdapter;
//! use schemagen::compile::compile;
//! use schemagen::config::CompileOptions;
//!
//! let adapter = SnapshotAdapter::load("shop.json".as_ref())?;
//! let options = CompileOptions { backend: "typedb".to_string(), ..Default::default() };
//! let compilation = compile(&adapter, &options)?;
//! println!("{}", compilation.output);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod adapter;
pub mod backends;
pub mod cli;
pub mod commands;
pub mod compile;
pub mod config;
pub mod coreference;
pub mod error;
pub mod ir;
pub mod output;
pub mod postprocess;
pub mod types;

#[macro_use]
pub mod test_macros;

#[cfg(test)]
pub mod test_utils;
