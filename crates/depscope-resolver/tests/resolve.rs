use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use depscope_core::declaration::DeclarationFile;
use depscope_core::dependency::{FileDependency, ModuleDependency, ScopeSpec};
use depscope_core::dependency_set::DependencySet;
use depscope_core::module::{ModuleId, Version, VersionRange, VersionedModule};
use depscope_core::scope::{COMPILE, PROVIDED, RUNTIME, TEST};
use depscope_resolver::metadata::{
    Caller, Configurations, MetadataResolution, ModuleMetadataResolver, ResolveRequest,
    ResolvedNode,
};
use depscope_resolver::report::{ErrorReport, MissingArtifact};
use depscope_resolver::resolver::DependencyResolver;

/// Serves a fixed node list, keeping the nodes pulled under one of the
/// requested configurations.
#[derive(Default)]
struct Fixture {
    nodes: Vec<ResolvedNode>,
    missing: Vec<MissingArtifact>,
    fail: bool,
    requests: Mutex<Vec<ResolveRequest>>,
}

impl Fixture {
    fn serving(nodes: Vec<ResolvedNode>) -> Arc<Self> {
        Arc::new(Self {
            nodes,
            ..Self::default()
        })
    }

    fn requests(&self) -> Vec<ResolveRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl ModuleMetadataResolver for Fixture {
    fn resolve(&self, request: &ResolveRequest) -> miette::Result<MetadataResolution> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(miette::miette!("repository unreachable"));
        }
        let nodes = match request.configurations {
            Configurations::All => self.nodes.clone(),
            Configurations::Named(ref names) => self
                .nodes
                .iter()
                .filter(|n| n.root_configurations.iter().any(|c| names.contains(c)))
                .cloned()
                .collect(),
        };
        Ok(MetadataResolution {
            nodes,
            errors: ErrorReport::failure(self.missing.clone()),
        })
    }

    fn fetch(&self, dependency: &ModuleDependency) -> miette::Result<PathBuf> {
        Ok(PathBuf::from(format!(
            "cache/{}-{}.jar",
            dependency.module_id.name, dependency.version
        )))
    }
}

const APP: &str = "my:app";

fn id(coordinates: &str) -> ModuleId {
    ModuleId::parse(coordinates)
        .unwrap_or_else(|| ModuleId::new("org.example", coordinates))
}

fn app() -> VersionedModule {
    VersionedModule::parse("my:app:1.0").unwrap()
}

fn node(name: &str, version: &str, callers: &[&str], root_confs: &[&str]) -> ResolvedNode {
    ResolvedNode {
        module_id: id(name),
        resolved_version: Version::new(version),
        callers: callers
            .iter()
            .map(|c| Caller {
                module_id: id(c),
                declared_version: VersionRange::new(version),
                declared_configurations: vec!["default".to_string()],
            })
            .collect(),
        root_configurations: root_confs.iter().map(|c| c.to_string()).collect(),
        files: vec![PathBuf::from(format!("repo/{name}-{version}.jar"))],
        evicted: false,
    }
}

fn evicted(name: &str, version: &str, callers: &[&str], root_confs: &[&str]) -> ResolvedNode {
    ResolvedNode {
        evicted: true,
        ..node(name, version, callers, root_confs)
    }
}

fn resolver(fixture: &Arc<Fixture>) -> DependencyResolver {
    DependencyResolver::new(fixture.clone()).with_module(app())
}

fn labels(result: &depscope_resolver::result::ResolveResult) -> Vec<String> {
    result
        .tree()
        .children()
        .iter()
        .map(|c| c.info().to_string())
        .collect()
}

#[test]
fn test_files_and_modules_keep_declaration_order() {
    let fixture = Fixture::serving(vec![
        node("a", "1.0", &[APP], &["compile"]),
        node("t", "3.1", &["a"], &["compile"]),
        node("b", "1.0", &[APP], &["test"]),
    ]);
    let set = DependencySet::new()
        .and_file("libs/first.jar", &TEST)
        .and_module("org.example:a:1.0", &COMPILE)
        .unwrap()
        .and_file("libs/second.jar", &COMPILE)
        .and_module("org.example:b:1.0", &TEST)
        .unwrap()
        .and(FileDependency::single("libs/third.jar"), ScopeSpec::Unset);

    let all = resolver(&fixture).resolve(&set, &[]).unwrap();
    assert_eq!(
        labels(&all),
        vec![
            "file:libs/first.jar [test]",
            "org.example:a:1.0 [compile]",
            "file:libs/second.jar [compile]",
            "org.example:b:1.0 [test]",
            "file:libs/third.jar",
        ]
    );
    assert_eq!(all.tree().child(&id("a")).unwrap().children().len(), 1);

    let compile = resolver(&fixture)
        .resolve(&set, &[COMPILE.clone()])
        .unwrap();
    assert_eq!(
        labels(&compile),
        vec![
            "org.example:a:1.0 [compile]",
            "file:libs/second.jar [compile]",
            "file:libs/third.jar",
        ]
    );
    assert_eq!(
        compile.files(&[COMPILE.clone()]),
        vec![
            PathBuf::from("repo/a-1.0.jar"),
            PathBuf::from("repo/t-3.1.jar"),
            PathBuf::from("libs/second.jar"),
            PathBuf::from("libs/third.jar"),
        ]
    );
}

#[test]
fn test_two_files_and_one_module_without_scope() {
    let fixture = Fixture::serving(vec![node("lib", "2.0", &[APP], &["compile"])]);
    let set = DependencySet::new()
        .and_file("libs/a.jar", &COMPILE)
        .and_module("org.example:lib:2.0", &COMPILE)
        .unwrap()
        .and_file("libs/b.jar", &TEST);
    let result = resolver(&fixture).resolve(&set, &[]).unwrap();
    assert_eq!(result.tree().children().len(), 3);
    assert!(result.tree().children()[1].module_info().is_some());

    let request = &fixture.requests()[0];
    assert_eq!(request.configurations, Configurations::All);
    assert!(!request.output_report);
    assert_eq!(request.dependencies.len(), 1);
    assert_eq!(request.root, app());
}

#[test]
fn test_compile_module_follows_scope_inheritance() {
    let fixture = Fixture::serving(vec![node("lib", "1.0", &[APP], &["compile"])]);
    let set = DependencySet::new()
        .and_module("org.example:lib:1.0", &COMPILE)
        .unwrap();
    let lib = id("lib");

    for requested in [RUNTIME.clone(), TEST.clone()] {
        let result = resolver(&fixture)
            .resolve(&set, &[requested.clone()])
            .unwrap();
        assert!(result.contains(&lib), "missing for {}", requested.name());
    }
    let requests = fixture.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.output_report));
    assert_eq!(requests[0].configurations.names(), vec!["compile"]);

    let provided = resolver(&fixture)
        .resolve(&set, &[PROVIDED.clone()])
        .unwrap();
    assert!(!provided.contains(&lib));
    assert!(provided.tree().children().is_empty());
    assert_eq!(
        fixture.requests().len(),
        2,
        "resolver must not be asked for nothing"
    );
}

#[test]
fn test_unscoped_module_is_requested_for_any_scope() {
    let fixture = Fixture::serving(vec![node("lib", "1.0", &[APP], &["compile"])]);
    let set = DependencySet::new()
        .and_module("org.example:lib:1.0", ScopeSpec::Unset)
        .unwrap();
    let result = resolver(&fixture)
        .resolve(&set, &[COMPILE.clone()])
        .unwrap();
    assert!(result.contains(&id("lib")));
    assert_eq!(
        fixture.requests()[0].configurations.names(),
        vec!["compile"]
    );
}

#[test]
fn test_evicted_module_is_a_leaf() {
    let fixture = Fixture::serving(vec![
        node("a", "1.0", &[APP], &["compile"]),
        node("b", "1.0", &[APP], &["compile"]),
        evicted("m", "1.0", &["a"], &["compile"]),
        node("m", "2.0", &["b"], &["compile"]),
        node("x", "1.0", &["m"], &["compile"]),
    ]);
    let set = DependencySet::new()
        .and_module("org.example:a:1.0", &COMPILE)
        .unwrap()
        .and_module("org.example:b:1.0", &COMPILE)
        .unwrap();
    let result = resolver(&fixture).resolve(&set, &[]).unwrap();

    let m = id("m");
    assert!(result.contains(&m));
    let found = result.tree().find(&m).unwrap().module_info().unwrap();
    assert!(!found.evicted);
    assert_eq!(found.resolved_version, Some(Version::new("2.0")));
    assert_eq!(result.version_of(&m), Some(Version::new("2.0")));

    let lines = result.tree().to_strings();
    let evicted_at = lines.iter().position(|l| l.ends_with("(evicted)")).unwrap();
    assert!(
        lines[evicted_at + 1].starts_with("org.example:b"),
        "got: {lines:?}"
    );
    assert_eq!(
        lines.iter().filter(|l| l.contains("org.example:x")).count(),
        1
    );

    assert!(!result.files(&[]).contains(&PathBuf::from("repo/m-1.0.jar")));
    assert!(result.files(&[]).contains(&PathBuf::from("repo/m-2.0.jar")));
}

#[test]
fn test_declared_exact_version_wins() {
    let mut lib = node("lib", "2.0", &[APP, "other"], &["compile"]);
    lib.callers[0].declared_version = VersionRange::new("1.0");
    let fixture = Fixture::serving(vec![node("other", "1.0", &[APP], &["compile"]), lib]);
    let set = DependencySet::new()
        .and_module("org.example:lib:1.0", &COMPILE)
        .unwrap()
        .and_module("org.example:other:1.0", &COMPILE)
        .unwrap();
    let result = resolver(&fixture).resolve(&set, &[]).unwrap();

    assert_eq!(result.version_of(&id("lib")), Some(Version::new("1.0")));
    let request = &fixture.requests()[0];
    assert_eq!(
        request.version_overrides.get(&id("lib")),
        Some(&Version::new("1.0"))
    );
}

#[test]
fn test_dynamic_versions_are_recorded() {
    let mut dynamic = node("dyn", "1.4", &[APP], &["compile"]);
    dynamic.callers[0].declared_version = VersionRange::new("1.+");
    let fixture = Fixture::serving(vec![dynamic]);
    let set = DependencySet::new()
        .and_module("org.example:dyn:1.+", &COMPILE)
        .unwrap();
    let result = resolver(&fixture).resolve(&set, &[]).unwrap();

    assert!(!fixture.requests()[0].version_overrides.contains(&id("dyn")));
    assert_eq!(
        result.version_overrides().get(&id("dyn")),
        Some(&Version::new("1.4"))
    );
}

#[test]
fn test_snapshot_versions_are_not_recorded() {
    let mut snap = node("snap", "1.0-SNAPSHOT", &[APP], &["compile"]);
    snap.callers[0].declared_version = VersionRange::new("[1.0-SNAPSHOT]");
    let mut nightly = node("nightly", "2.1-SNAPSHOT", &[APP], &["compile"]);
    nightly.callers[0].declared_version = VersionRange::new("latest.integration");
    let fixture = Fixture::serving(vec![snap, nightly]);
    let set = DependencySet::new()
        .and_module("org.example:snap:[1.0-SNAPSHOT]", &COMPILE)
        .unwrap()
        .and_module("org.example:nightly:latest.integration", &COMPILE)
        .unwrap();
    let result = resolver(&fixture).resolve(&set, &[]).unwrap();

    assert!(result.contains(&id("snap")));
    assert_eq!(result.version_overrides().get(&id("snap")), None);
    assert_eq!(result.version_overrides().get(&id("nightly")), None);
    assert_eq!(
        result.version_of(&id("snap")),
        Some(Version::new("1.0-SNAPSHOT"))
    );
}

#[test]
fn test_missing_artifacts_are_reported() {
    let fixture = Arc::new(Fixture {
        nodes: vec![node("lib", "1.0", &[APP], &["compile"])],
        missing: vec![MissingArtifact {
            module_id: id("lib"),
            version: Some(Version::new("1.0")),
            artifact: "lib-1.0-sources.jar".to_string(),
        }],
        ..Fixture::default()
    });
    let set = DependencySet::new()
        .and_module("org.example:lib:1.0", &COMPILE)
        .unwrap();

    let result = resolver(&fixture).resolve(&set, &[]).unwrap();
    assert!(result.error_report().has_errors());
    assert!(result.contains(&id("lib")));
    let err = result.assert_no_error().unwrap_err();
    assert!(err.to_string().contains("lib-1.0-sources.jar"));

    assert!(resolver(&fixture).files(&set, &[]).is_err());
}

#[test]
fn test_collaborator_errors_propagate() {
    let fixture = Arc::new(Fixture {
        fail: true,
        ..Fixture::default()
    });
    let set = DependencySet::new()
        .and_module("org.example:lib:1.0", &COMPILE)
        .unwrap();
    let err = resolver(&fixture).resolve(&set, &[]).unwrap_err();
    assert_eq!(err.to_string(), "repository unreachable");
}

#[test]
fn test_cyclic_caller_graph_is_an_error() {
    let fixture = Fixture::serving(vec![
        node("a", "1.0", &[APP, "b"], &["compile"]),
        node("b", "1.0", &["a"], &["compile"]),
    ]);
    let set = DependencySet::new()
        .and_module("org.example:a:1.0", &COMPILE)
        .unwrap();
    let err = resolver(&fixture).resolve(&set, &[]).unwrap_err();
    assert!(
        err.to_string().starts_with("Dependency cycle detected"),
        "got: {err}"
    );
}

#[test]
fn test_tree_properties() {
    let fixture = Fixture::serving(vec![
        node("a", "1.0", &[APP], &["compile"]),
        node("b", "1.0", &[APP], &["compile"]),
        node("c", "1.0", &["a", "b"], &["compile"]),
        node("d", "1.0", &["c"], &["compile"]),
    ]);
    let set = DependencySet::new()
        .and_module("org.example:a:1.0", &COMPILE)
        .unwrap()
        .and_module("org.example:b:1.0", &COMPILE)
        .unwrap();
    let tree = resolver(&fixture)
        .resolve(&set, &[])
        .unwrap()
        .tree()
        .clone();

    assert_eq!(tree.merge(&tree), tree);

    let lines = tree.to_strings();
    assert_eq!(
        lines.iter().filter(|l| l.contains("org.example:d")).count(),
        1
    );

    // root, a, c, d, b, c, d
    assert_eq!(tree.flatten().len(), 7);
    assert!(tree.flatten().len() >= tree.module_ids().len());
}

#[test]
fn test_files_only_lists_needed_artifacts() {
    let fixture = Fixture::serving(vec![
        node("lib", "1.0", &[APP], &["compile"]),
        node("junit", "4.12", &[APP], &["test"]),
    ]);
    let set = DependencySet::new()
        .and_module("org.example:lib:1.0", &COMPILE)
        .unwrap()
        .and_module("org.example:junit:4.12", &TEST)
        .unwrap()
        .and_file("libs/extra.jar", &TEST);

    let runtime = resolver(&fixture).files(&set, &[RUNTIME.clone()]).unwrap();
    assert_eq!(runtime, vec![PathBuf::from("repo/lib-1.0.jar")]);

    let test = resolver(&fixture).files(&set, &[TEST.clone()]).unwrap();
    assert_eq!(
        test,
        vec![
            PathBuf::from("repo/lib-1.0.jar"),
            PathBuf::from("repo/junit-4.12.jar"),
            PathBuf::from("libs/extra.jar"),
        ]
    );
}

#[test]
fn test_fetch_delegates_to_metadata_resolver() {
    let fixture = Fixture::serving(Vec::new());
    let dep = ModuleDependency::parse("org.example:lib:1.0").unwrap();
    let path = resolver(&fixture).fetch(&dep).unwrap();
    assert_eq!(path, PathBuf::from("cache/lib-1.0.jar"));
}

#[test]
fn test_resolve_declaration_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deps.toml");
    std::fs::write(
        &path,
        r#"
[module]
id = "my:app"
version = "1.0"

[parameters]
default-mapping = "standard"

[[dependencies]]
files = ["libs/a.jar"]
scopes = ["test"]

[[dependencies]]
module = "org.example:lib:1.0"
scopes = ["compile"]
"#,
    )
    .unwrap();

    let file = DeclarationFile::from_path(&path).unwrap();
    let set = file.to_dependency_set().unwrap();
    let fixture = Fixture::serving(vec![node("lib", "1.0", &[APP], &["compile"])]);
    let resolver = DependencyResolver::new(fixture.clone())
        .with_module(file.module().unwrap().unwrap())
        .with_parameters(file.parameters().unwrap());

    let result = resolver.resolve(&set, &[TEST.clone()]).unwrap();
    assert_eq!(
        result.files(&[TEST.clone()]),
        vec![
            dir.path().join("libs/a.jar"),
            PathBuf::from("repo/lib-1.0.jar"),
        ]
    );
    assert!(fixture.requests()[0].parameters.default_mapping.is_some());
}
