//! Core value types for depscope.
//!
//! This crate defines what a caller declares before resolution: scopes and
//! scope mappings, module identities and version constraints, module and file
//! dependencies, ordered dependency sets, version overrides, resolution
//! parameters and the declaration file format.
//!
//! This crate performs no resolution and no network I/O.

pub mod config;
pub mod declaration;
pub mod dependency;
pub mod dependency_set;
pub mod module;
pub mod scope;
pub mod version_overrides;
