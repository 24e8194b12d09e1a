//! Resolution engine: asks the metadata resolver for the module graph, builds
//! the tree and splices the declared file dependencies into it.

use std::path::PathBuf;
use std::sync::Arc;

use depscope_core::config::ResolutionParameters;
use depscope_core::dependency::{Dependency, ModuleDependency, ScopeSpec};
use depscope_core::dependency_set::DependencySet;
use depscope_core::module::VersionedModule;
use depscope_core::scope::Scope;
use depscope_core::version_overrides::VersionOverrides;
use depscope_util::errors::DepscopeError;

use crate::metadata::{Configurations, ModuleMetadataResolver, ResolveRequest};
use crate::node::DependencyNode;
use crate::report::ErrorReport;
use crate::result::ResolveResult;
use crate::tree_builder::{root_info, TreeBuilder};

/// Resolves dependency sets into [`ResolveResult`]s.
///
/// Without a metadata resolver only file dependencies can be resolved.
#[derive(Clone, Default)]
pub struct DependencyResolver {
    metadata: Option<Arc<dyn ModuleMetadataResolver>>,
    module: Option<VersionedModule>,
    parameters: ResolutionParameters,
}

impl DependencyResolver {
    pub fn new(metadata: Arc<dyn ModuleMetadataResolver>) -> Self {
        Self {
            metadata: Some(metadata),
            module: None,
            parameters: ResolutionParameters::standard(),
        }
    }

    /// A resolver for sets made of file dependencies only.
    pub fn offline() -> Self {
        Self::default()
    }

    /// Set the module the resolution is made for. Anonymous otherwise.
    pub fn with_module(mut self, module: VersionedModule) -> Self {
        self.module = Some(module);
        self
    }

    pub fn with_parameters(mut self, parameters: ResolutionParameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn parameters(&self) -> &ResolutionParameters {
        &self.parameters
    }

    pub fn module(&self) -> Option<&VersionedModule> {
        self.module.as_ref()
    }

    /// Resolve `set` for `scopes`. No scope means every scope.
    ///
    /// Declared file dependencies end up as direct children of the root, in
    /// declaration order relative to the declared modules.
    pub fn resolve(&self, set: &DependencySet, scopes: &[Scope]) -> miette::Result<ResolveResult> {
        let Some(ref metadata) = self.metadata else {
            if set.contains_modules() {
                return Err(no_metadata_resolver(set.modules().count()).into());
            }
            tracing::debug!(
                dependencies = set.len(),
                "resolving file dependencies only"
            );
            let tree = self.root_node().merge_non_modules(set, scopes);
            return Ok(ResolveResult::new(tree, VersionOverrides::new(), ErrorReport::all_fine()));
        };

        let root = self
            .module
            .clone()
            .unwrap_or_else(VersionedModule::anonymous);
        if scopes.is_empty() {
            tracing::info!(module = %root, "Resolving dependencies for any scope");
        } else {
            let names: Vec<&str> = scopes.iter().map(Scope::name).collect();
            tracing::info!(module = %root, scopes = ?names, "Resolving dependencies");
        }

        let modules = set.only_modules();
        let configurations = Configurations::for_scopes(&declared_scopes(&modules, scopes), scopes);
        let explicit_versions = set.explicit_versions();

        let (tree, errors) = if modules.is_empty() || configurations.is_empty() {
            tracing::debug!(
                modules = modules.len(),
                "no configuration to resolve, skipping the metadata resolver"
            );
            (self.root_node(), ErrorReport::all_fine())
        } else {
            tracing::debug!(configurations = ?configurations.names(), "requesting configurations");
            let request = ResolveRequest {
                root: root.clone(),
                dependencies: modules,
                parameters: self.parameters.clone(),
                version_overrides: explicit_versions.clone(),
                output_report: configurations != Configurations::All,
                configurations,
            };
            let resolution = metadata.resolve(&request)?;
            let tree = TreeBuilder::from_resolved(&resolution.nodes).build(&root)?;
            (tree, resolution.errors)
        };

        let version_overrides = record_dynamic_versions(set, &tree, explicit_versions);
        let tree = tree.merge_non_modules(set, scopes);
        let result = ResolveResult::new(tree, version_overrides, errors);
        tracing::info!(
            modules = result.involved_modules().len(),
            artifacts = result.files(scopes).len(),
            "Resolution done"
        );
        Ok(result)
    }

    /// Files needed for `scopes`, modules resolved and checked for missing
    /// artifacts. Ordered by declaration, transitive files after the module
    /// bringing them.
    pub fn files(&self, set: &DependencySet, scopes: &[Scope]) -> miette::Result<Vec<PathBuf>> {
        if self.metadata.is_some() && set.contains_modules() {
            let result = self.resolve(set, scopes)?.assert_no_error()?;
            return Ok(result.files(scopes));
        }
        if set.contains_modules() {
            return Err(no_metadata_resolver(set.modules().count()).into());
        }
        let mut files: Vec<PathBuf> = Vec::new();
        for declared in set {
            let Dependency::File(ref file) = declared.dependency else {
                continue;
            };
            if !declared.is_involved_in_any_of(scopes) {
                continue;
            }
            for path in file.paths() {
                if !files.contains(path) {
                    files.push(path.clone());
                }
            }
        }
        Ok(files)
    }

    /// Download a single module artifact outside of any graph resolution.
    pub fn fetch(&self, dependency: &ModuleDependency) -> miette::Result<PathBuf> {
        let Some(ref metadata) = self.metadata else {
            return Err(DepscopeError::Resolution {
                message: format!("cannot fetch {dependency}: no metadata resolver configured"),
            }
            .into());
        };
        tracing::debug!(dependency = %dependency, "fetching artifact");
        metadata.fetch(dependency)
    }

    fn root_node(&self) -> DependencyNode {
        let root = self
            .module
            .clone()
            .unwrap_or_else(VersionedModule::anonymous);
        DependencyNode::root(root_info(&root))
    }
}

/// Scopes the module entries are declared for. Unscoped entries are
/// involved in every requested scope.
fn declared_scopes(modules: &DependencySet, requested: &[Scope]) -> Vec<Scope> {
    let mut declared = modules.involved_scopes();
    if modules.iter().any(|d| d.spec == ScopeSpec::Unset) {
        for scope in requested {
            if !declared.contains(scope) {
                declared.push(scope.clone());
            }
        }
    }
    declared
}

/// Exact declared versions, plus the versions picked for modules declared
/// with a dynamic constraint. Snapshots are never pinned.
fn record_dynamic_versions(
    set: &DependencySet,
    tree: &DependencyNode,
    explicit: VersionOverrides,
) -> VersionOverrides {
    let mut overrides = explicit;
    for module in set.modules() {
        if !module.version.is_dynamic_and_resolvable() || overrides.contains(&module.module_id) {
            continue;
        }
        let resolved = tree
            .child(&module.module_id)
            .and_then(DependencyNode::module_info)
            .filter(|info| !info.evicted)
            .and_then(|info| info.resolved_version.clone())
            .filter(|version| !version.is_snapshot());
        if let Some(version) = resolved {
            tracing::debug!(
                module = %module.module_id,
                version = %version,
                "recording dynamic version"
            );
            overrides.insert(module.module_id.clone(), version);
        }
    }
    overrides
}

fn no_metadata_resolver(modules: usize) -> DepscopeError {
    DepscopeError::Declaration {
        message: format!(
            "{modules} module dependenc{} declared but no metadata resolver is configured",
            if modules == 1 { "y" } else { "ies" }
        ),
    }
}
