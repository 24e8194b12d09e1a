//! Missing-artifact reporting.

use std::fmt;

use depscope_core::module::{ModuleId, Version};
use depscope_util::errors::DepscopeError;

/// Artifacts the metadata resolver could not retrieve during one resolution.
///
/// An empty report means everything was fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorReport {
    pub missing: Vec<MissingArtifact>,
}

/// An artifact that was declared by a resolved module but could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingArtifact {
    pub module_id: ModuleId,
    pub version: Option<Version>,
    pub artifact: String,
}

impl ErrorReport {
    pub fn all_fine() -> Self {
        Self::default()
    }

    pub fn failure(missing: Vec<MissingArtifact>) -> Self {
        Self { missing }
    }

    pub fn add(&mut self, artifact: MissingArtifact) {
        self.missing.push(artifact);
    }

    pub fn has_errors(&self) -> bool {
        !self.missing.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn len(&self) -> usize {
        self.missing.len()
    }

    /// The error raised when a caller insists on a complete resolution.
    pub fn to_error(&self) -> DepscopeError {
        let details: Vec<String> = self.missing.iter().map(|m| m.to_string()).collect();
        DepscopeError::MissingArtifacts {
            count: self.missing.len(),
            details: details.join(", "),
        }
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.missing.is_empty() {
            return write!(f, "No missing artifacts.");
        }
        writeln!(f, "Missing artifacts ({}):", self.missing.len())?;
        for m in &self.missing {
            writeln!(f, "  {m}")?;
        }
        Ok(())
    }
}

impl fmt::Display for MissingArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            Some(ref version) => write!(f, "{}:{} ({})", self.module_id, version, self.artifact),
            None => write!(f, "{} ({})", self.module_id, self.artifact),
        }
    }
}
