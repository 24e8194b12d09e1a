//! Scopes and scope mappings.
//!
//! A scope is a named usage context for a dependency (compile, runtime,
//! test...). Scopes inherit from other scopes: resolving for `TEST` also
//! brings in what was declared for `RUNTIME` and `PROVIDED`, and transitively
//! `COMPILE`. A scope mapping translates a consumer scope into the names of
//! the configurations a module exposes.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, LazyLock};

/// A named usage context with an inheritance graph and per-instance exclusions.
///
/// Cheap to clone. Equality and hashing only consider the name.
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

struct ScopeInner {
    name: String,
    inherits_from: Vec<Scope>,
    excluding: Vec<Scope>,
}

impl Scope {
    /// Create a scope inheriting from the given scopes.
    pub fn of(name: impl Into<String>, inherits_from: &[&Scope]) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                name: name.into(),
                inherits_from: inherits_from.iter().map(|s| (*s).clone()).collect(),
                excluding: Vec::new(),
            }),
        }
    }

    /// Create a scope that inherits from nothing.
    pub fn named(name: impl Into<String>) -> Self {
        Self::of(name, &[])
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn inherits_from(&self) -> &[Scope] {
        &self.inner.inherits_from
    }

    pub fn excluded(&self) -> &[Scope] {
        &self.inner.excluding
    }

    /// A copy of this scope that does not follow inheritance through `scopes`.
    pub fn excluding(&self, scopes: &[&Scope]) -> Self {
        let mut excluding = self.inner.excluding.clone();
        for scope in scopes {
            if !excluding.contains(scope) {
                excluding.push((*scope).clone());
            }
        }
        Self {
            inner: Arc::new(ScopeInner {
                name: self.inner.name.clone(),
                inherits_from: self.inner.inherits_from.clone(),
                excluding,
            }),
        }
    }

    /// This scope followed by every scope it inherits from, depth first,
    /// without duplicates. Excluded parents are not followed.
    pub fn implied_scopes(&self) -> Vec<Scope> {
        let mut result = vec![self.clone()];
        for parent in &self.inner.inherits_from {
            if self.inner.excluding.contains(parent) {
                continue;
            }
            for scope in parent.implied_scopes() {
                if !result.contains(&scope) {
                    result.push(scope);
                }
            }
        }
        result
    }

    /// The members of `declared` reachable from this scope through inheritance.
    pub fn common_scopes<'a, I>(&self, declared: I) -> Vec<Scope>
    where
        I: IntoIterator<Item = &'a Scope>,
    {
        let implied = self.implied_scopes();
        let mut result: Vec<Scope> = Vec::new();
        for scope in declared {
            if implied.contains(scope) && !result.contains(scope) {
                result.push(scope.clone());
            }
        }
        result
    }

    /// True if this scope is one of `scopes` or inherits from one of them.
    pub fn is_in_or_inherits_any_of<'a, I>(&self, scopes: I) -> bool
    where
        I: IntoIterator<Item = &'a Scope>,
    {
        let implied = self.implied_scopes();
        scopes.into_iter().any(|s| implied.contains(s))
    }

    /// A single-item mapping from this scope to `target`.
    pub fn map_to(&self, target: impl Into<String>) -> ScopeMapping {
        ScopeMapping::of(self, &Scope::named(target))
    }
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        self.inner.name == other.inner.name
    }
}

impl Eq for Scope {}

impl Hash for Scope {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.name.hash(state);
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scope({})", self.inner.name)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.name)
    }
}

/// Dependencies needed to compile but not embedded in produced artifacts.
pub static PROVIDED: LazyLock<Scope> = LazyLock::new(|| Scope::named("provided"));

/// Dependencies needed to compile the project.
pub static COMPILE: LazyLock<Scope> = LazyLock::new(|| Scope::named("compile"));

/// Dependencies embedded in produced artifacts.
pub static RUNTIME: LazyLock<Scope> = LazyLock::new(|| Scope::of("runtime", &[&COMPILE]));

/// Dependencies needed to compile and run tests.
pub static TEST: LazyLock<Scope> = LazyLock::new(|| Scope::of("test", &[&RUNTIME, &PROVIDED]));

/// The artifacts produced by a module, without their dependencies.
pub static MASTER: LazyLock<Scope> = LazyLock::new(|| Scope::named("master"));

/// Produced artifacts along with their runtime dependencies.
pub static DEFAULT: LazyLock<Scope> = LazyLock::new(|| Scope::of("default", &[&MASTER, &RUNTIME]));

/// The predefined scopes, in declaration order.
pub fn standard_scopes() -> Vec<Scope> {
    vec![
        PROVIDED.clone(),
        COMPILE.clone(),
        RUNTIME.clone(),
        TEST.clone(),
        MASTER.clone(),
        DEFAULT.clone(),
    ]
}

/// Mapping from the standard consumer scopes to the configurations
/// published by Maven-style modules.
pub fn default_scope_mapping() -> ScopeMapping {
    ScopeMapping::of_many(&[&COMPILE], &["archives(master)", "compile(default)"])
        .and_mapping(&ScopeMapping::of_many(
            &[&PROVIDED],
            &["archives(master)", "compile(default)"],
        ))
        .and_mapping(&ScopeMapping::of_many(&[&RUNTIME], &["archives(master)", "runtime(default)"]))
        .and_mapping(&ScopeMapping::of_many(
            &[&TEST],
            &["archives(master)", "runtime(default)", "test(runtime)"],
        ))
}

/// One `from -> to` entry of a [`ScopeMapping`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MappingItem {
    pub from: Scope,
    pub to: Scope,
}

/// An ordered multi-relation between source scopes and target scopes.
///
/// No inheritance is applied inside a mapping: callers needing inherited
/// behavior expand source scopes with [`Scope::implied_scopes`] first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeMapping {
    items: Vec<MappingItem>,
}

impl ScopeMapping {
    /// The empty mapping.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn of(from: &Scope, to: &Scope) -> Self {
        Self::empty().and(from, to)
    }

    /// Map every scope of `from` to every configuration name of `to`.
    pub fn of_many(from: &[&Scope], to: &[&str]) -> Self {
        let mut items = Vec::new();
        for source in from {
            for target in to {
                let item = MappingItem {
                    from: (*source).clone(),
                    to: Scope::named(*target),
                };
                if !items.contains(&item) {
                    items.push(item);
                }
            }
        }
        Self { items }
    }

    /// A copy with one more item.
    pub fn and(&self, from: &Scope, to: &Scope) -> Self {
        let mut items = self.items.clone();
        items.push(MappingItem {
            from: from.clone(),
            to: to.clone(),
        });
        Self { items }
    }

    /// Union: this mapping's items followed by `other`'s.
    pub fn and_mapping(&self, other: &ScopeMapping) -> Self {
        let mut items = self.items.clone();
        items.extend(other.items.iter().cloned());
        Self { items }
    }

    /// Difference: every item of this mapping that `other` does not contain.
    pub fn minus(&self, other: &ScopeMapping) -> Self {
        let items = self
            .items
            .iter()
            .filter(|item| !other.items.contains(item))
            .cloned()
            .collect();
        Self { items }
    }

    /// All targets mapped from exactly `source`.
    pub fn target_scopes(&self, source: &Scope) -> HashSet<Scope> {
        self.items
            .iter()
            .filter(|item| &item.from == source)
            .map(|item| item.to.clone())
            .collect()
    }

    /// The distinct source scopes, in declaration order.
    pub fn involved_scopes(&self) -> Vec<Scope> {
        let mut result: Vec<Scope> = Vec::new();
        for item in &self.items {
            if !result.contains(&item.from) {
                result.push(item.from.clone());
            }
        }
        result
    }

    pub fn items(&self) -> &[MappingItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl fmt::Display for ScopeMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .items
            .iter()
            .map(|item| format!("{} -> {}", item.from, item.to))
            .collect();
        write!(f, "[{}]", parts.join(", "))
    }
}
