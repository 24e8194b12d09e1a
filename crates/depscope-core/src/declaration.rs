use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use depscope_util::errors::DepscopeError;

use crate::config::{MappingConfig, ParametersConfig, ResolutionParameters};
use crate::dependency::{FileDependency, ModuleDependency, ScopeSpec, ScopedDependency};
use crate::dependency_set::DependencySet;
use crate::module::{ModuleId, Version, VersionedModule};
use crate::scope::{standard_scopes, Scope};

/// The parsed representation of a dependency declaration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeclarationFile {
    #[serde(default)]
    pub module: Option<ModuleSection>,

    #[serde(default)]
    pub parameters: ParametersConfig,

    #[serde(default)]
    pub scopes: BTreeMap<String, ScopeDeclaration>,

    #[serde(default)]
    pub dependencies: Vec<DependencyDeclaration>,

    /// Directory relative file dependencies are resolved against.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

/// Identity of the consuming module from the `[module]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleSection {
    pub id: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// A custom scope from `[scopes.<name>]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScopeDeclaration {
    #[serde(default)]
    pub inherits: Vec<String>,
    #[serde(default)]
    pub excluding: Vec<String>,
}

/// One `[[dependencies]]` entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyDeclaration {
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub mapping: BTreeMap<String, Vec<String>>,
}

impl DeclarationFile {
    /// Load and parse a declaration file. Relative file dependencies are
    /// resolved against the file's directory.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DepscopeError::Declaration {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        let mut file = Self::from_str(&content)?;
        file.base_dir = path.parent().map(Path::to_path_buf);
        Ok(file)
    }

    /// Parse a declaration file from a string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> miette::Result<Self> {
        toml::from_str(content).map_err(|e| {
            DepscopeError::Declaration {
                message: format!("Failed to parse declarations: {e}"),
            }
            .into()
        })
    }

    /// The consuming module, if the file names one.
    pub fn module(&self) -> miette::Result<Option<VersionedModule>> {
        let Some(ref section) = self.module else {
            return Ok(None);
        };
        let id = ModuleId::parse(&section.id).ok_or_else(|| DepscopeError::Declaration {
            message: format!("Invalid module id '{}' (expected group:name)", section.id),
        })?;
        let version = section
            .version
            .as_deref()
            .map(Version::new)
            .unwrap_or_else(Version::unspecified);
        Ok(Some(VersionedModule::new(id, version)))
    }

    /// Look up a scope by name among the standard and declared scopes.
    pub fn scope(&self, name: &str) -> miette::Result<Scope> {
        self.build_scope(name, &mut Vec::new())
    }

    fn build_scope(&self, name: &str, visiting: &mut Vec<String>) -> miette::Result<Scope> {
        let standard = standard_scopes().into_iter().find(|s| s.name() == name);
        let Some(decl) = self.scopes.get(name) else {
            return standard.ok_or_else(|| {
                DepscopeError::Declaration {
                    message: format!("Unknown scope '{name}'"),
                }
                .into()
            });
        };
        if standard.is_some() {
            return Err(DepscopeError::Declaration {
                message: format!("Scope '{name}' is predefined and cannot be redeclared"),
            }
            .into());
        }
        if visiting.iter().any(|v| v == name) {
            visiting.push(name.to_string());
            return Err(DepscopeError::Declaration {
                message: format!("Cyclic scope inheritance: {}", visiting.join(" -> ")),
            }
            .into());
        }
        visiting.push(name.to_string());
        let mut parents = Vec::new();
        for parent in &decl.inherits {
            parents.push(self.build_scope(parent, visiting)?);
        }
        let mut excluded = Vec::new();
        for excl in &decl.excluding {
            excluded.push(self.build_scope(excl, visiting)?);
        }
        visiting.pop();

        let parent_refs: Vec<&Scope> = parents.iter().collect();
        let excluded_refs: Vec<&Scope> = excluded.iter().collect();
        Ok(Scope::of(name, &parent_refs).excluding(&excluded_refs))
    }

    pub fn parameters(&self) -> miette::Result<ResolutionParameters> {
        self.parameters.to_parameters(|name| self.scope(name))
    }

    /// Build the declared dependencies, in file order.
    pub fn to_dependency_set(&self) -> miette::Result<DependencySet> {
        let mut set = DependencySet::new();
        for (i, decl) in self.dependencies.iter().enumerate() {
            set = set.and_scoped(self.to_scoped_dependency(i, decl)?);
        }
        Ok(set)
    }

    fn to_scoped_dependency(
        &self,
        index: usize,
        decl: &DependencyDeclaration,
    ) -> miette::Result<ScopedDependency> {
        let invalid = |message: &str| -> miette::Report {
            DepscopeError::Declaration {
                message: format!("dependencies[{index}]: {message}"),
            }
            .into()
        };

        if !decl.scopes.is_empty() && !decl.mapping.is_empty() {
            return Err(invalid("'scopes' and 'mapping' are mutually exclusive"));
        }
        let spec = if !decl.mapping.is_empty() {
            let table = MappingConfig::Table(decl.mapping.clone());
            ScopeSpec::Mapping(table.to_mapping(|name| self.scope(name))?)
        } else {
            let mut scopes = Vec::new();
            for name in &decl.scopes {
                scopes.push(self.scope(name)?);
            }
            ScopeSpec::scopes(&scopes)
        };

        match (&decl.module, decl.files.is_empty()) {
            (Some(coordinates), true) => {
                let module = ModuleDependency::parse(coordinates)
                    .ok_or_else(|| invalid(&format!("invalid coordinates '{coordinates}'")))?;
                Ok(ScopedDependency::new(module, spec))
            }
            (None, false) => {
                let files = FileDependency::of(&decl.files);
                let files = match self.base_dir {
                    Some(ref dir) => files.relative_to(dir),
                    None => files,
                };
                Ok(ScopedDependency::new(files, spec))
            }
            (Some(_), false) => Err(invalid("declares both 'module' and 'files'")),
            (None, true) => Err(invalid("declares neither 'module' nor 'files'")),
        }
    }
}
