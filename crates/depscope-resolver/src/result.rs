//! The outcome of one resolution.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use depscope_core::module::{ModuleId, Version};
use depscope_core::scope::Scope;
use depscope_core::version_overrides::VersionOverrides;

use crate::node::{DependencyNode, NodeInfo};
use crate::report::ErrorReport;

/// A resolved tree, the versions that override it and the artifacts that
/// could not be fetched. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveResult {
    tree: DependencyNode,
    version_overrides: VersionOverrides,
    error_report: ErrorReport,
}

impl ResolveResult {
    pub fn new(
        tree: DependencyNode,
        version_overrides: VersionOverrides,
        error_report: ErrorReport,
    ) -> Self {
        Self {
            tree,
            version_overrides,
            error_report,
        }
    }

    pub fn tree(&self) -> &DependencyNode {
        &self.tree
    }

    pub fn version_overrides(&self) -> &VersionOverrides {
        &self.version_overrides
    }

    pub fn error_report(&self) -> &ErrorReport {
        &self.error_report
    }

    /// Whether a non-evicted node stands for `module_id`.
    pub fn contains(&self, module_id: &ModuleId) -> bool {
        self.tree
            .find(module_id)
            .and_then(DependencyNode::module_info)
            .is_some_and(|info| !info.evicted)
    }

    /// The version in effect for `module_id`: an override if any, otherwise
    /// the version the tree resolved.
    pub fn version_of(&self, module_id: &ModuleId) -> Option<Version> {
        if let Some(version) = self.version_overrides.get(module_id) {
            return Some(version.clone());
        }
        self.tree
            .find(module_id)
            .and_then(DependencyNode::module_info)
            .filter(|info| !info.evicted)
            .and_then(|info| info.resolved_version.clone())
    }

    /// Files needed for `scopes`, in tree order and without duplicates. No
    /// scope means every scope.
    pub fn files(&self, scopes: &[Scope]) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = Vec::new();
        for info in self.tree.flatten() {
            let candidates = match info {
                NodeInfo::File(file) if file.spec.is_involved_in_any_of(scopes) => {
                    file.dependency.paths()
                }
                NodeInfo::Module(module)
                    if !module.evicted && module.is_pulled_under_any_of(scopes) =>
                {
                    module.files.as_slice()
                }
                _ => continue,
            };
            for path in candidates {
                if !files.contains(path) {
                    files.push(path.clone());
                }
            }
        }
        files
    }

    /// Ids of every non-evicted module in the tree.
    pub fn involved_modules(&self) -> BTreeSet<ModuleId> {
        self.tree.module_ids()
    }

    /// Paths of the declared file dependencies, in tree order.
    pub fn local_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = Vec::new();
        for info in self.tree.flatten() {
            if let NodeInfo::File(file) = info {
                for path in file.dependency.paths() {
                    if !files.contains(path) {
                        files.push(path.clone());
                    }
                }
            }
        }
        files
    }

    /// Combine two results. Trees are merged, overrides of `self` win and
    /// missing artifacts are concatenated.
    pub fn and(&self, other: &ResolveResult) -> ResolveResult {
        let mut error_report = self.error_report.clone();
        for missing in &other.error_report.missing {
            error_report.add(missing.clone());
        }
        ResolveResult {
            tree: self.tree.merge(&other.tree),
            version_overrides: self.version_overrides.and_all(&other.version_overrides),
            error_report,
        }
    }

    /// Fail if any artifact is missing, otherwise hand the result back.
    pub fn assert_no_error(self) -> miette::Result<Self> {
        if self.error_report.has_errors() {
            tracing::warn!(
                missing = self.error_report.len(),
                "resolution left artifacts unresolved"
            );
            return Err(self.error_report.to_error().into());
        }
        Ok(self)
    }
}

impl fmt::Display for ResolveResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.tree.fmt(f)
    }
}
