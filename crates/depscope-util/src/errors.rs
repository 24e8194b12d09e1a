use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all depscope operations.
#[derive(Debug, Error, Diagnostic)]
pub enum DepscopeError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed dependency declaration, scope or mapping.
    #[error("Declaration error: {message}")]
    #[diagnostic(help("Check the dependency declarations and scope names"))]
    Declaration { message: String },

    /// Dependency resolution could not be carried out.
    #[error("Dependency resolution failed: {message}")]
    Resolution { message: String },

    /// The resolution finished but some artifacts could not be retrieved.
    #[error("{count} artifact(s) could not be resolved: {details}")]
    #[diagnostic(help("Check the repositories and the declared coordinates"))]
    MissingArtifacts { count: usize, details: String },

    /// The caller graph reported by the metadata resolver loops back on itself.
    #[error("Dependency cycle detected: {path}")]
    DependencyCycle { path: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type DepscopeResult<T> = miette::Result<T>;
