//! HiFriend - Incremental static type inference for Ruby
//!
//! This crate provides the type inference engine: a graph of type vertices
//! built per file, a relational symbol store for method resolution and an
//! update coordinator that re-analyzes files incrementally.

pub mod types;
pub mod parser;
pub mod syntax;
pub mod source_map;
pub mod graph;
pub mod env;
pub mod store;
pub mod analyzer;
pub mod stdlib;
pub mod service;
pub mod diagnostics;
pub mod config;
pub mod error;

#[cfg(feature = "lsp")]
pub mod lsp;
