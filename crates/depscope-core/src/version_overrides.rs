//! Module id to version table used to pin versions during resolution.

use std::collections::BTreeMap;
use std::fmt;

use crate::module::{ModuleId, Version};

/// Versions forced for given modules, whatever transitive dependencies ask for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionOverrides {
    versions: BTreeMap<ModuleId, Version>,
}

impl VersionOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy with `module_id` pinned to `version`, replacing any prior entry.
    pub fn and(&self, module_id: ModuleId, version: Version) -> Self {
        let mut versions = self.versions.clone();
        versions.insert(module_id, version);
        Self { versions }
    }

    /// A copy including every entry of `other` not already present here.
    /// Entries of `self` take precedence.
    pub fn and_all(&self, other: &VersionOverrides) -> Self {
        let mut versions = self.versions.clone();
        for (id, version) in &other.versions {
            versions
                .entry(id.clone())
                .or_insert_with(|| version.clone());
        }
        Self { versions }
    }

    pub fn insert(&mut self, module_id: ModuleId, version: Version) {
        self.versions.insert(module_id, version);
    }

    pub fn get(&self, module_id: &ModuleId) -> Option<&Version> {
        self.versions.get(module_id)
    }

    pub fn contains(&self, module_id: &ModuleId) -> bool {
        self.versions.contains_key(module_id)
    }

    pub fn module_ids(&self) -> impl Iterator<Item = &ModuleId> {
        self.versions.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ModuleId, &Version)> {
        self.versions.iter()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

impl FromIterator<(ModuleId, Version)> for VersionOverrides {
    fn from_iter<T: IntoIterator<Item = (ModuleId, Version)>>(iter: T) -> Self {
        Self {
            versions: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for VersionOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .versions
            .iter()
            .map(|(id, v)| format!("{id}:{v}"))
            .collect();
        write!(f, "[{}]", parts.join(", "))
    }
}
