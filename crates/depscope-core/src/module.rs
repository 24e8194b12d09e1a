//! Module identities and versions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// `group:name` identifier of a module, without version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId {
    pub group: String,
    pub name: String,
}

impl ModuleId {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }

    /// Parse `"group:name"`.
    pub fn parse(s: &str) -> Option<Self> {
        let (group, name) = s.split_once(':')?;
        if group.is_empty() || name.is_empty() || name.contains(':') {
            return None;
        }
        Some(Self::new(group, name))
    }

    /// Identity used for the consuming module when the caller did not name one.
    pub fn anonymous() -> Self {
        Self::new("anonymous", "anonymous")
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

/// A concrete version name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Placeholder version for modules that carry none.
    pub fn unspecified() -> Self {
        Self::new("unspecified")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_snapshot(&self) -> bool {
        self.0.ends_with("-SNAPSHOT")
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A version constraint as written in a declaration: an exact version,
/// a range (`[1.0,2.0)`), a prefix (`1.+`) or a `latest.*` selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionRange(String);

impl VersionRange {
    pub fn new(definition: impl Into<String>) -> Self {
        Self(definition.into())
    }

    pub fn definition(&self) -> &str {
        &self.0
    }

    /// True unless the definition names one exact version.
    pub fn is_dynamic(&self) -> bool {
        let d = self.0.as_str();
        d.ends_with('+')
            || d.starts_with('[')
            || d.starts_with('(')
            || d.ends_with(']')
            || d.ends_with(')')
            || d.starts_with("latest.")
    }

    /// Dynamic constraints that a repository can settle on one version.
    /// Snapshot constraints, bracketed or not, are excluded.
    pub fn is_dynamic_and_resolvable(&self) -> bool {
        self.is_dynamic() && !self.0.contains("-SNAPSHOT")
    }

    /// The exact version this range names, if it is not dynamic.
    pub fn as_exact(&self) -> Option<Version> {
        if self.is_dynamic() {
            None
        } else {
            Some(Version::new(self.0.clone()))
        }
    }
}

impl From<&Version> for VersionRange {
    fn from(version: &Version) -> Self {
        Self::new(version.as_str())
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A module at one concrete version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionedModule {
    pub id: ModuleId,
    pub version: Version,
}

impl VersionedModule {
    pub fn new(id: ModuleId, version: Version) -> Self {
        Self { id, version }
    }

    /// Parse `"group:name:version"`.
    pub fn parse(s: &str) -> Option<Self> {
        let (id, version) = s.rsplit_once(':')?;
        if version.is_empty() {
            return None;
        }
        Some(Self::new(ModuleId::parse(id)?, Version::new(version)))
    }

    pub fn anonymous() -> Self {
        Self::new(ModuleId::anonymous(), Version::unspecified())
    }
}

impl fmt::Display for VersionedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.version)
    }
}
