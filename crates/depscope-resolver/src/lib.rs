//! Resolution engine: turns a declared dependency set into a scoped,
//! queryable dependency tree, delegating module metadata to a
//! [`metadata::ModuleMetadataResolver`].

pub mod metadata;
pub mod node;
pub mod report;
pub mod resolver;
pub mod result;
pub mod tree_builder;
