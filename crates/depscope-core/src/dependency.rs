use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::module::{ModuleId, VersionRange};
use crate::scope::{Scope, ScopeMapping};

/// A dependency: either a module resolved transitively through a metadata
/// resolver, or files referenced directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dependency {
    Module(ModuleDependency),
    File(FileDependency),
}

impl Dependency {
    pub fn as_module(&self) -> Option<&ModuleDependency> {
        match self {
            Dependency::Module(m) => Some(m),
            Dependency::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileDependency> {
        match self {
            Dependency::File(f) => Some(f),
            Dependency::Module(_) => None,
        }
    }
}

impl From<ModuleDependency> for Dependency {
    fn from(dep: ModuleDependency) -> Self {
        Dependency::Module(dep)
    }
}

impl From<FileDependency> for Dependency {
    fn from(dep: FileDependency) -> Self {
        Dependency::File(dep)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dependency::Module(m) => m.fmt(f),
            Dependency::File(d) => d.fmt(f),
        }
    }
}

/// A module identified by coordinates and a version constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleDependency {
    pub module_id: ModuleId,
    pub version: VersionRange,
    pub classifier: Option<String>,
    pub ext: Option<String>,
}

impl ModuleDependency {
    pub fn new(module_id: ModuleId, version: VersionRange) -> Self {
        Self {
            module_id,
            version,
            classifier: None,
            ext: None,
        }
    }

    /// Parse `"group:name:version"`, optionally followed by `:classifier`
    /// and/or an `@ext` suffix.
    pub fn parse(s: &str) -> Option<Self> {
        let (coords, ext) = match s.rsplit_once('@') {
            Some((coords, ext)) if !ext.is_empty() && !ext.contains(':') => {
                (coords, Some(ext.to_string()))
            }
            Some(_) => return None,
            None => (s, None),
        };
        let parts: Vec<&str> = coords.split(':').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return None;
        }
        let (group, name, version, classifier) = match parts.as_slice() {
            [g, n, v] => (*g, *n, *v, None),
            [g, n, v, c] => (*g, *n, *v, Some(c.to_string())),
            _ => return None,
        };
        Some(Self {
            module_id: ModuleId::new(group, name),
            version: VersionRange::new(version),
            classifier,
            ext,
        })
    }

    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    pub fn with_ext(mut self, ext: impl Into<String>) -> Self {
        self.ext = Some(ext.into());
        self
    }
}

impl fmt::Display for ModuleDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module_id, self.version)?;
        if let Some(ref classifier) = self.classifier {
            write!(f, ":{classifier}")?;
        }
        if let Some(ref ext) = self.ext {
            write!(f, "@{ext}")?;
        }
        Ok(())
    }
}

/// One or more files used as a dependency as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileDependency {
    paths: Vec<PathBuf>,
}

impl FileDependency {
    pub fn of<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn single(path: impl Into<PathBuf>) -> Self {
        Self {
            paths: vec![path.into()],
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// The same files resolved against `base` when relative.
    pub fn relative_to(&self, base: &Path) -> Self {
        Self {
            paths: self
                .paths
                .iter()
                .map(|p| {
                    if p.is_absolute() {
                        p.clone()
                    } else {
                        base.join(p)
                    }
                })
                .collect(),
        }
    }
}

impl fmt::Display for FileDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let paths: Vec<String> = self.paths.iter().map(|p| p.display().to_string()).collect();
        write!(f, "file:{}", paths.join(","))
    }
}

/// How a declared dependency is scoped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ScopeSpec {
    /// Involved in every scope.
    #[default]
    Unset,
    /// Involved in these scopes and in every scope inheriting from them.
    Scopes(Vec<Scope>),
    /// Consumer scopes mapped to the module's own configurations.
    Mapping(ScopeMapping),
}

impl ScopeSpec {
    /// Build a `Scopes` spec, dropping duplicates. An empty list means `Unset`.
    pub fn scopes<'a, I>(scopes: I) -> Self
    where
        I: IntoIterator<Item = &'a Scope>,
    {
        let mut list: Vec<Scope> = Vec::new();
        for scope in scopes {
            if !list.contains(scope) {
                list.push(scope.clone());
            }
        }
        if list.is_empty() {
            ScopeSpec::Unset
        } else {
            ScopeSpec::Scopes(list)
        }
    }

    /// Scopes this spec declares: the simple scopes, or a mapping's sources.
    pub fn declared_scopes(&self) -> Vec<Scope> {
        match self {
            ScopeSpec::Unset => Vec::new(),
            ScopeSpec::Scopes(scopes) => scopes.clone(),
            ScopeSpec::Mapping(mapping) => mapping.involved_scopes(),
        }
    }

    pub fn is_involved_in(&self, scope: &Scope) -> bool {
        match self {
            ScopeSpec::Unset => true,
            ScopeSpec::Scopes(scopes) => scope.is_in_or_inherits_any_of(scopes),
            ScopeSpec::Mapping(mapping) => {
                scope.is_in_or_inherits_any_of(&mapping.involved_scopes())
            }
        }
    }

    /// True if involved in one of `scopes`. An empty request means every scope.
    pub fn is_involved_in_any_of(&self, scopes: &[Scope]) -> bool {
        scopes.is_empty() || scopes.iter().any(|s| self.is_involved_in(s))
    }
}

impl From<&Scope> for ScopeSpec {
    fn from(scope: &Scope) -> Self {
        ScopeSpec::Scopes(vec![scope.clone()])
    }
}

impl From<&LazyLock<Scope>> for ScopeSpec {
    fn from(scope: &LazyLock<Scope>) -> Self {
        ScopeSpec::Scopes(vec![Scope::clone(scope)])
    }
}

impl From<&[&Scope]> for ScopeSpec {
    fn from(scopes: &[&Scope]) -> Self {
        ScopeSpec::scopes(scopes.iter().copied())
    }
}

impl<const N: usize> From<[&Scope; N]> for ScopeSpec {
    fn from(scopes: [&Scope; N]) -> Self {
        ScopeSpec::scopes(scopes)
    }
}

impl From<ScopeMapping> for ScopeSpec {
    fn from(mapping: ScopeMapping) -> Self {
        ScopeSpec::Mapping(mapping)
    }
}

impl fmt::Display for ScopeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeSpec::Unset => Ok(()),
            ScopeSpec::Scopes(scopes) => {
                let names: Vec<&str> = scopes.iter().map(|s| s.name()).collect();
                write!(f, "[{}]", names.join(", "))
            }
            ScopeSpec::Mapping(mapping) => mapping.fmt(f),
        }
    }
}

/// A dependency paired with the scopes it is declared for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedDependency {
    pub dependency: Dependency,
    pub spec: ScopeSpec,
}

impl ScopedDependency {
    pub fn new(dependency: impl Into<Dependency>, spec: impl Into<ScopeSpec>) -> Self {
        Self {
            dependency: dependency.into(),
            spec: spec.into(),
        }
    }

    pub fn unscoped(dependency: impl Into<Dependency>) -> Self {
        Self {
            dependency: dependency.into(),
            spec: ScopeSpec::Unset,
        }
    }

    pub fn is_involved_in(&self, scope: &Scope) -> bool {
        self.spec.is_involved_in(scope)
    }

    pub fn is_involved_in_any_of(&self, scopes: &[Scope]) -> bool {
        self.spec.is_involved_in_any_of(scopes)
    }
}

impl fmt::Display for ScopedDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.spec {
            ScopeSpec::Unset => self.dependency.fmt(f),
            _ => write!(f, "{} {}", self.dependency, self.spec),
        }
    }
}
