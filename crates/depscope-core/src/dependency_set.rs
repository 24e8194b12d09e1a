//! Ordered dependency declarations.

use std::fmt;
use std::path::PathBuf;

use crate::dependency::{Dependency, FileDependency, ModuleDependency, ScopeSpec, ScopedDependency};
use crate::module::ModuleId;
use crate::scope::Scope;
use crate::version_overrides::VersionOverrides;

/// An ordered, duplicate-permitting sequence of scoped dependencies.
///
/// Declaration order is kept: it drives the child order of resolved trees
/// and the order of file lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySet {
    dependencies: Vec<ScopedDependency>,
    default_spec: ScopeSpec,
}

impl DependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spec applied to entries later added through [`DependencySet::and_default`].
    pub fn with_default_spec(mut self, spec: impl Into<ScopeSpec>) -> Self {
        self.default_spec = spec.into();
        self
    }

    pub fn and(mut self, dependency: impl Into<Dependency>, spec: impl Into<ScopeSpec>) -> Self {
        self.dependencies.push(ScopedDependency::new(dependency, spec));
        self
    }

    /// Add a dependency scoped with the current default spec.
    pub fn and_default(mut self, dependency: impl Into<Dependency>) -> Self {
        let spec = self.default_spec.clone();
        self.dependencies.push(ScopedDependency::new(dependency, spec));
        self
    }

    pub fn and_scoped(mut self, dependency: ScopedDependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Add a module given as `"group:name:version"`.
    pub fn and_module(self, coordinates: &str, spec: impl Into<ScopeSpec>) -> miette::Result<Self> {
        let dependency = ModuleDependency::parse(coordinates).ok_or_else(|| {
            depscope_util::errors::DepscopeError::Declaration {
                message: format!("Invalid module coordinates '{coordinates}'"),
            }
        })?;
        Ok(self.and(dependency, spec))
    }

    pub fn and_file(self, path: impl Into<PathBuf>, spec: impl Into<ScopeSpec>) -> Self {
        self.and(FileDependency::single(path), spec)
    }

    /// A copy without any module entry for `module_id`. File entries are kept.
    pub fn without(&self, module_id: &ModuleId) -> Self {
        let dependencies = self
            .dependencies
            .iter()
            .filter(|d| {
                d.dependency
                    .as_module()
                    .map_or(true, |m| &m.module_id != module_id)
            })
            .cloned()
            .collect();
        Self {
            dependencies,
            default_spec: self.default_spec.clone(),
        }
    }

    /// The first module entry declared for `module_id`.
    pub fn get(&self, module_id: &ModuleId) -> Option<&ScopedDependency> {
        self.dependencies.iter().find(|d| {
            d.dependency
                .as_module()
                .is_some_and(|m| &m.module_id == module_id)
        })
    }

    /// The union of every entry's declared scopes and mapping source scopes.
    pub fn involved_scopes(&self) -> Vec<Scope> {
        let mut result: Vec<Scope> = Vec::new();
        for dep in &self.dependencies {
            for scope in dep.spec.declared_scopes() {
                if !result.contains(&scope) {
                    result.push(scope);
                }
            }
        }
        result
    }

    pub fn only_modules(&self) -> Self {
        self.filtered(|d| d.as_module().is_some())
    }

    pub fn only_files(&self) -> Self {
        self.filtered(|d| d.as_file().is_some())
    }

    pub fn contains_modules(&self) -> bool {
        self.dependencies
            .iter()
            .any(|d| d.dependency.as_module().is_some())
    }

    /// Exact versions of the declared modules. Dynamic constraints are skipped.
    pub fn explicit_versions(&self) -> VersionOverrides {
        let mut overrides = VersionOverrides::new();
        for module in self.modules() {
            if overrides.contains(&module.module_id) {
                continue;
            }
            if let Some(version) = module.version.as_exact() {
                overrides.insert(module.module_id.clone(), version);
            }
        }
        overrides
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleDependency> {
        self.dependencies
            .iter()
            .filter_map(|d| d.dependency.as_module())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScopedDependency> {
        self.dependencies.iter()
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    fn filtered(&self, keep: impl Fn(&Dependency) -> bool) -> Self {
        Self {
            dependencies: self
                .dependencies
                .iter()
                .filter(|d| keep(&d.dependency))
                .cloned()
                .collect(),
            default_spec: self.default_spec.clone(),
        }
    }
}

impl<'a> IntoIterator for &'a DependencySet {
    type Item = &'a ScopedDependency;
    type IntoIter = std::slice::Iter<'a, ScopedDependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.dependencies.iter()
    }
}

impl FromIterator<ScopedDependency> for DependencySet {
    fn from_iter<T: IntoIterator<Item = ScopedDependency>>(iter: T) -> Self {
        Self {
            dependencies: iter.into_iter().collect(),
            default_spec: ScopeSpec::Unset,
        }
    }
}

impl fmt::Display for DependencySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for dep in &self.dependencies {
            writeln!(f, "{dep}")?;
        }
        Ok(())
    }
}
