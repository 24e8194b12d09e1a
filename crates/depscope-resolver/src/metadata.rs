//! Contract of the external module metadata resolver.
//!
//! Fetching module descriptors, negotiating versions across repositories and
//! downloading artifacts all happen behind [`ModuleMetadataResolver`]. The
//! engine only consumes the flat, caller-annotated node list it returns.

use std::collections::BTreeSet;
use std::path::PathBuf;

use depscope_core::config::ResolutionParameters;
use depscope_core::dependency::ModuleDependency;
use depscope_core::dependency_set::DependencySet;
use depscope_core::module::{ModuleId, Version, VersionRange, VersionedModule};
use depscope_core::scope::Scope;
use depscope_core::version_overrides::VersionOverrides;

use crate::report::ErrorReport;

/// Reserved configuration name standing for every public configuration.
pub const ALL_CONFIGURATIONS: &str = "*(public)";

/// Configurations the metadata resolver is asked to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Configurations {
    All,
    Named(BTreeSet<String>),
}

impl Configurations {
    /// The configuration names needed to serve `requested` scopes, given the
    /// scopes declared by the dependency set. No requested scope means all.
    pub fn for_scopes(declared: &[Scope], requested: &[Scope]) -> Self {
        if requested.is_empty() {
            return Configurations::All;
        }
        let names = requested
            .iter()
            .flat_map(|r| r.common_scopes(declared))
            .map(|s| s.name().to_string())
            .collect();
        Configurations::Named(names)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Configurations::Named(names) if names.is_empty())
    }

    pub fn names(&self) -> Vec<&str> {
        match self {
            Configurations::All => vec![ALL_CONFIGURATIONS],
            Configurations::Named(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

/// Everything the metadata resolver needs for one resolution.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    /// The consuming module.
    pub root: VersionedModule,
    /// Module dependencies only; file dependencies never reach the resolver.
    pub dependencies: DependencySet,
    pub parameters: ResolutionParameters,
    /// Versions that win over whatever transitive dependencies ask for.
    pub version_overrides: VersionOverrides,
    pub configurations: Configurations,
    /// Whether the resolver may emit its detailed report. Always off when
    /// every configuration is requested, since an empty match is not a failure.
    pub output_report: bool,
}

/// What the metadata resolver returns: resolved nodes and missing artifacts.
#[derive(Debug, Clone, Default)]
pub struct MetadataResolution {
    pub nodes: Vec<ResolvedNode>,
    pub errors: ErrorReport,
}

/// A module version settled by the metadata resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNode {
    pub module_id: ModuleId,
    pub resolved_version: Version,
    /// Modules depending on this one, in the order the resolver met them.
    pub callers: Vec<Caller>,
    /// Configurations of the consuming module this node was pulled under.
    pub root_configurations: Vec<String>,
    /// Local artifact files downloaded for this node.
    pub files: Vec<PathBuf>,
    /// Lost a version conflict against another node with the same module id.
    pub evicted: bool,
}

/// One module depending on a resolved node, and how it declared it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub module_id: ModuleId,
    pub declared_version: VersionRange,
    pub declared_configurations: Vec<String>,
}

/// The external collaborator resolving module graphs.
///
/// Implementations own their network and cache behaviour; errors they return
/// are propagated to callers unchanged.
pub trait ModuleMetadataResolver: Send + Sync {
    fn resolve(&self, request: &ResolveRequest) -> miette::Result<MetadataResolution>;

    /// Download a single artifact outside of any graph resolution.
    fn fetch(&self, dependency: &ModuleDependency) -> miette::Result<PathBuf>;
}
