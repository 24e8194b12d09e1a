//! Turns the flat, caller-annotated node list returned by the metadata
//! resolver into a [`DependencyNode`] tree.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use depscope_core::module::{ModuleId, Version, VersionRange, VersionedModule};
use depscope_core::scope::Scope;
use depscope_util::errors::DepscopeError;

use crate::metadata::ResolvedNode;
use crate::node::{DependencyNode, ModuleNodeInfo};

/// Adjacency arena: one graph node per module id, one edge per
/// (parent, child) pair carrying the child as the parent declared it.
///
/// Children keep the order in which they were added. The first child info
/// recorded for a module id under a given parent wins.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    graph: DiGraph<ModuleId, ModuleNodeInfo>,
    index: HashMap<ModuleId, NodeIndex>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every resolved node under each of its callers.
    pub fn from_resolved(nodes: &[ResolvedNode]) -> Self {
        let mut builder = Self::new();
        for node in nodes {
            let root_scopes: Vec<Scope> = node
                .root_configurations
                .iter()
                .map(|name| Scope::named(name.as_str()))
                .collect();
            for caller in &node.callers {
                let info = ModuleNodeInfo {
                    module_id: node.module_id.clone(),
                    declared_version: caller.declared_version.clone(),
                    resolved_version: Some(node.resolved_version.clone()),
                    declared_scopes: caller
                        .declared_configurations
                        .iter()
                        .map(|name| Scope::named(name.as_str()))
                        .collect(),
                    root_scopes: root_scopes.clone(),
                    evicted: node.evicted,
                    files: node.files.clone(),
                };
                builder.add_child(&caller.module_id, info);
            }
        }
        tracing::trace!(
            modules = builder.graph.node_count(),
            edges = builder.graph.edge_count(),
            "built dependency arena"
        );
        builder
    }

    fn add_module(&mut self, module_id: &ModuleId) -> NodeIndex {
        if let Some(&idx) = self.index.get(module_id) {
            return idx;
        }
        let idx = self.graph.add_node(module_id.clone());
        self.index.insert(module_id.clone(), idx);
        idx
    }

    /// Append `child` to the children of `parent`. Returns `false` when the
    /// parent already has a child with the same module id.
    pub fn add_child(&mut self, parent: &ModuleId, child: ModuleNodeInfo) -> bool {
        let from = self.add_module(parent);
        let to = self.add_module(&child.module_id);
        if self.graph.edges(from).any(|e| e.target() == to) {
            tracing::trace!(parent = %parent, child = %child.module_id, "duplicate child ignored");
            return false;
        }
        self.graph.add_edge(from, to, child);
        true
    }

    /// Children recorded for `parent`, in insertion order.
    pub fn children_of(&self, parent: &ModuleId) -> Vec<&ModuleNodeInfo> {
        let Some(&idx) = self.index.get(parent) else {
            return Vec::new();
        };
        let mut edges: Vec<_> = self.graph.edges(idx).collect();
        edges.sort_by_key(|e| e.id());
        edges.into_iter().map(|e| e.weight()).collect()
    }

    /// Materialize the tree below the consuming module.
    pub fn build(&self, root: &VersionedModule) -> miette::Result<DependencyNode> {
        let info = root_info(root);
        let mut path = Vec::new();
        self.materialize(info, &mut path)
    }

    fn materialize(
        &self,
        info: ModuleNodeInfo,
        path: &mut Vec<ModuleId>,
    ) -> miette::Result<DependencyNode> {
        if info.evicted {
            return Ok(DependencyNode::of_module(info, Vec::new()));
        }
        path.push(info.module_id.clone());
        let mut children = Vec::new();
        for child in self.children_of(&info.module_id) {
            if !child.evicted && path.contains(&child.module_id) {
                let mut cycle: Vec<String> = path.iter().map(ToString::to_string).collect();
                cycle.push(child.module_id.to_string());
                return Err(DepscopeError::DependencyCycle {
                    path: cycle.join(" -> "),
                }
                .into());
            }
            children.push(self.materialize(child.clone(), path)?);
        }
        path.pop();
        Ok(DependencyNode::of_module(info, children))
    }
}

/// The synthetic root describing the consuming module.
pub(crate) fn root_info(root: &VersionedModule) -> ModuleNodeInfo {
    let resolved_version = if root.version == Version::unspecified() {
        None
    } else {
        Some(root.version.clone())
    };
    ModuleNodeInfo {
        resolved_version,
        ..ModuleNodeInfo::new(root.id.clone(), VersionRange::from(&root.version))
    }
}
