//! Shared utilities for depscope.
//!
//! This crate provides the cross-cutting error type used by the core value
//! types and the resolution engine.

pub mod errors;
