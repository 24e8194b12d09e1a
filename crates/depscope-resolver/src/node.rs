//! The resolved dependency tree.
//!
//! Trees are immutable once built: [`DependencyNode::merge`] and
//! [`DependencyNode::merge_non_modules`] return new trees.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::PathBuf;

use depscope_core::dependency::{Dependency, FileDependency, ScopeSpec};
use depscope_core::dependency_set::DependencySet;
use depscope_core::module::{ModuleId, Version, VersionRange};
use depscope_core::scope::Scope;
use depscope_core::version_overrides::VersionOverrides;

const INDENT: &str = "    ";

/// A module as it appears at one position of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleNodeInfo {
    pub module_id: ModuleId,
    /// Version constraint written by the parent.
    pub declared_version: VersionRange,
    /// Version picked by the metadata resolver. `None` on the synthetic root
    /// when the consuming module has no version.
    pub resolved_version: Option<Version>,
    /// Configurations the parent asked this module for.
    pub declared_scopes: Vec<Scope>,
    /// Consumer scopes this module was pulled under.
    pub root_scopes: Vec<Scope>,
    pub evicted: bool,
    /// Local artifacts supplied by the metadata resolver.
    pub files: Vec<PathBuf>,
}

impl ModuleNodeInfo {
    pub fn new(module_id: ModuleId, declared_version: VersionRange) -> Self {
        Self {
            module_id,
            declared_version,
            resolved_version: None,
            declared_scopes: Vec::new(),
            root_scopes: Vec::new(),
            evicted: false,
            files: Vec::new(),
        }
    }

    /// Whether this module was pulled under one of `requested` scopes. An
    /// empty request, or a node without root scopes, always matches.
    pub fn is_pulled_under_any_of(&self, requested: &[Scope]) -> bool {
        if requested.is_empty() || self.root_scopes.is_empty() {
            return true;
        }
        requested
            .iter()
            .any(|r| r.is_in_or_inherits_any_of(&self.root_scopes))
    }
}

impl fmt::Display for ModuleNodeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.module_id)?;
        match self.resolved_version {
            Some(ref version) if version.as_str() != self.declared_version.definition() => {
                write!(f, "{} ({})", version, self.declared_version)?
            }
            Some(ref version) => write!(f, "{version}")?,
            None => write!(f, "{}", self.declared_version)?,
        }
        if !self.root_scopes.is_empty() {
            let names: Vec<&str> = self.root_scopes.iter().map(Scope::name).collect();
            write!(f, " [{}]", names.join(", "))?;
        }
        if self.evicted {
            write!(f, " (evicted)")?;
        }
        Ok(())
    }
}

/// A declared file dependency placed in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNodeInfo {
    pub dependency: FileDependency,
    pub spec: ScopeSpec,
}

/// Payload of a tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeInfo {
    Module(ModuleNodeInfo),
    File(FileNodeInfo),
}

impl NodeInfo {
    pub fn as_module(&self) -> Option<&ModuleNodeInfo> {
        match self {
            NodeInfo::Module(info) => Some(info),
            NodeInfo::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileNodeInfo> {
        match self {
            NodeInfo::File(info) => Some(info),
            NodeInfo::Module(_) => None,
        }
    }

    fn key(&self) -> NodeKey<'_> {
        match self {
            NodeInfo::Module(info) => NodeKey::Module(&info.module_id),
            NodeInfo::File(info) => NodeKey::File(&info.dependency),
        }
    }
}

impl fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeInfo::Module(info) => info.fmt(f),
            NodeInfo::File(info) => match info.spec {
                ScopeSpec::Unset => info.dependency.fmt(f),
                ref spec => write!(f, "{} {}", info.dependency, spec),
            },
        }
    }
}

/// Identity of a node among its siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum NodeKey<'a> {
    Module(&'a ModuleId),
    File(&'a FileDependency),
}

/// A node of the dependency tree with its ordered children.
///
/// The root is a module node describing the consuming module. Siblings never
/// share an identity: the module id for module nodes, the file dependency
/// value for file nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyNode {
    info: NodeInfo,
    children: Vec<DependencyNode>,
}

impl DependencyNode {
    /// A childless root node for the consuming module.
    pub fn root(info: ModuleNodeInfo) -> Self {
        Self::of_module(info, Vec::new())
    }

    pub fn of_module(info: ModuleNodeInfo, children: Vec<DependencyNode>) -> Self {
        Self {
            info: NodeInfo::Module(info),
            children: dedup_children(children),
        }
    }

    pub fn of_file(dependency: FileDependency, spec: ScopeSpec) -> Self {
        Self {
            info: NodeInfo::File(FileNodeInfo { dependency, spec }),
            children: Vec::new(),
        }
    }

    pub fn info(&self) -> &NodeInfo {
        &self.info
    }

    pub fn module_info(&self) -> Option<&ModuleNodeInfo> {
        self.info.as_module()
    }

    pub fn module_id(&self) -> Option<&ModuleId> {
        self.module_info().map(|info| &info.module_id)
    }

    pub fn children(&self) -> &[DependencyNode] {
        &self.children
    }

    /// The direct child standing for `module_id`.
    pub fn child(&self, module_id: &ModuleId) -> Option<&DependencyNode> {
        self.children
            .iter()
            .find(|c| c.module_id() == Some(module_id))
    }

    /// A copy whose children are this node's children followed by the
    /// children of `other` not already present.
    pub fn merge(&self, other: &DependencyNode) -> DependencyNode {
        let mut children = self.children.clone();
        for candidate in &other.children {
            let key = candidate.info.key();
            if !children.iter().any(|c| c.info.key() == key) {
                children.push(candidate.clone());
            }
        }
        DependencyNode {
            info: self.info.clone(),
            children,
        }
    }

    /// A copy whose direct children follow the declaration order of `set`.
    ///
    /// File dependencies involved in one of `scopes` are inserted as file
    /// nodes. Declared module children keep their subtree. Module children
    /// that were not declared directly come last, in their current order.
    pub fn merge_non_modules(&self, set: &DependencySet, scopes: &[Scope]) -> DependencyNode {
        let mut children: Vec<DependencyNode> = Vec::new();
        let mut placed: HashSet<NodeKey<'_>> = HashSet::new();

        for declared in set {
            match declared.dependency {
                Dependency::File(ref file) => {
                    if !declared.is_involved_in_any_of(scopes) {
                        continue;
                    }
                    if placed.insert(NodeKey::File(file)) {
                        children.push(DependencyNode::of_file(file.clone(), declared.spec.clone()));
                    }
                }
                Dependency::Module(ref module) => {
                    if let Some(child) = self.child(&module.module_id) {
                        if placed.insert(NodeKey::Module(&module.module_id)) {
                            children.push(child.clone());
                        }
                    }
                }
            }
        }
        for child in &self.children {
            if !placed.contains(&child.info.key()) {
                children.push(child.clone());
            }
        }
        DependencyNode {
            info: self.info.clone(),
            children,
        }
    }

    /// Every node below this one, depth first, parents before children.
    pub fn descendants(&self) -> Vec<&DependencyNode> {
        let mut result = Vec::new();
        self.collect_descendants(&mut result);
        result
    }

    fn collect_descendants<'a>(&'a self, result: &mut Vec<&'a DependencyNode>) {
        for child in &self.children {
            result.push(child);
            child.collect_descendants(result);
        }
    }

    /// The node standing for `module_id`, this node included, depth first.
    ///
    /// A non-evicted match is preferred; the first evicted match is only
    /// returned when no other exists.
    pub fn find(&self, module_id: &ModuleId) -> Option<&DependencyNode> {
        let mut first_evicted = None;
        let candidates = std::iter::once(self).chain(self.descendants());
        for node in candidates {
            let Some(info) = node.module_info() else {
                continue;
            };
            if &info.module_id != module_id {
                continue;
            }
            if !info.evicted {
                return Some(node);
            }
            if first_evicted.is_none() {
                first_evicted = Some(node);
            }
        }
        first_evicted
    }

    /// Every payload in pre-order, the root included, without suppressing
    /// repeated modules.
    pub fn flatten(&self) -> Vec<&NodeInfo> {
        std::iter::once(&self.info)
            .chain(self.descendants().into_iter().map(|n| &n.info))
            .collect()
    }

    /// Indented lines describing the tree below this node. A module already
    /// expanded earlier in the walk is listed again but not re-expanded.
    pub fn to_strings(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut expanded = HashSet::new();
        for child in &self.children {
            child.render(0, &mut expanded, &mut lines);
        }
        lines
    }

    fn render<'a>(
        &'a self,
        depth: usize,
        expanded: &mut HashSet<&'a ModuleId>,
        lines: &mut Vec<String>,
    ) {
        lines.push(format!("{}{}", INDENT.repeat(depth), self.info));
        if let Some(info) = self.module_info() {
            if !info.evicted && !expanded.insert(&info.module_id) {
                return;
            }
        }
        for child in &self.children {
            child.render(depth + 1, expanded, lines);
        }
    }

    /// Artifacts of the non-evicted module nodes, in flatten order, without
    /// duplicates.
    pub fn resolved_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for info in self.flatten() {
            if let Some(module) = info.as_module() {
                if !module.evicted {
                    push_unique(&mut files, &module.files);
                }
            }
        }
        files
    }

    /// Module artifacts and declared file paths, in flatten order, without
    /// duplicates.
    pub fn all_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for info in self.flatten() {
            match info {
                NodeInfo::Module(module) if !module.evicted => {
                    push_unique(&mut files, &module.files)
                }
                NodeInfo::Module(_) => {}
                NodeInfo::File(file) => push_unique(&mut files, file.dependency.paths()),
            }
        }
        files
    }

    /// Resolved version of every non-evicted module below this node.
    pub fn resolved_versions(&self) -> VersionOverrides {
        let mut versions = VersionOverrides::new();
        for node in self.descendants() {
            let Some(info) = node.module_info() else {
                continue;
            };
            if info.evicted || versions.contains(&info.module_id) {
                continue;
            }
            if let Some(ref version) = info.resolved_version {
                versions.insert(info.module_id.clone(), version.clone());
            }
        }
        versions
    }

    /// Ids of the non-evicted modules below this node.
    pub fn module_ids(&self) -> BTreeSet<ModuleId> {
        self.descendants()
            .into_iter()
            .filter_map(|n| n.module_info())
            .filter(|info| !info.evicted)
            .map(|info| info.module_id.clone())
            .collect()
    }
}

impl fmt::Display for DependencyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.info)?;
        for line in self.to_strings() {
            writeln!(f, "{INDENT}{line}")?;
        }
        Ok(())
    }
}

fn dedup_children(children: Vec<DependencyNode>) -> Vec<DependencyNode> {
    let mut result: Vec<DependencyNode> = Vec::with_capacity(children.len());
    for child in children {
        if !result.iter().any(|c| c.info.key() == child.info.key()) {
            result.push(child);
        }
    }
    result
}

fn push_unique(files: &mut Vec<PathBuf>, candidates: &[PathBuf]) {
    for path in candidates {
        if !files.contains(path) {
            files.push(path.clone());
        }
    }
}
