use std::path::{Path, PathBuf};

use depscope_core::declaration::DeclarationFile;
use depscope_core::dependency::ScopeSpec;
use depscope_core::module::ModuleId;
use depscope_core::scope::{default_scope_mapping, COMPILE, RUNTIME, TEST};

const SAMPLE: &str = r#"
[module]
id = "mygroup:myname"
version = "1.0"

[parameters]
refreshed = true
default-mapping = "standard"

[scopes.integration]
inherits = ["test"]

[[dependencies]]
files = ["libs/dep0.jar"]
scopes = ["test"]

[[dependencies]]
module = "org.springframework.boot:spring-boot-starter-web:1.5.3.RELEASE"
scopes = ["compile", "runtime"]

[[dependencies]]
module = "org.example:dyn:[1.0,2.0)"
mapping = { integration = ["runtime(default)", "archives(master)"] }

[[dependencies]]
files = ["/opt/libs/dep2.jar"]
"#;

#[test]
fn test_parse_sample() {
    let file = DeclarationFile::from_str(SAMPLE).unwrap();
    let module = file.module().unwrap().unwrap();
    assert_eq!(module.id, ModuleId::new("mygroup", "myname"));
    assert_eq!(module.version.as_str(), "1.0");

    let params = file.parameters().unwrap();
    assert!(params.refreshed);
    assert_eq!(params.default_mapping, Some(default_scope_mapping()));

    let set = file.to_dependency_set().unwrap();
    assert_eq!(set.len(), 4);
    let entries: Vec<_> = set.iter().collect();
    assert_eq!(entries[0].spec, ScopeSpec::Scopes(vec![TEST.clone()]));
    assert_eq!(
        entries[1].spec,
        ScopeSpec::Scopes(vec![COMPILE.clone(), RUNTIME.clone()])
    );
    match entries[2].spec {
        ScopeSpec::Mapping(ref mapping) => {
            let integration = file.scope("integration").unwrap();
            assert_eq!(mapping.target_scopes(&integration).len(), 2);
        }
        ref other => panic!("expected a mapping, got {other:?}"),
    }
    assert_eq!(entries[3].spec, ScopeSpec::Unset);
}

#[test]
fn test_from_path_resolves_relative_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deps.toml");
    std::fs::write(&path, SAMPLE).unwrap();

    let file = DeclarationFile::from_path(&path).unwrap();
    let set = file.to_dependency_set().unwrap();
    let files: Vec<PathBuf> = set
        .only_files()
        .iter()
        .flat_map(|d| d.dependency.as_file().unwrap().paths().to_vec())
        .collect();
    assert_eq!(
        files,
        vec![
            dir.path().join("libs/dep0.jar"),
            PathBuf::from("/opt/libs/dep2.jar"),
        ]
    );
}

#[test]
fn test_missing_file_is_declaration_error() {
    let missing = Path::new("/nonexistent/deps.toml");
    let err = DeclarationFile::from_path(missing).unwrap_err();
    assert!(err.to_string().contains("Declaration error"), "got: {err}");
}

#[test]
fn test_unknown_scope_is_rejected() {
    let file = DeclarationFile::from_str(
        r#"
[[dependencies]]
module = "org.example:lib:1.0"
scopes = ["nope"]
"#,
    )
    .unwrap();
    let err = file.to_dependency_set().unwrap_err();
    assert!(
        err.to_string().contains("Unknown scope 'nope'"),
        "got: {err}"
    );
}

#[test]
fn test_module_and_files_together_is_rejected() {
    let file = DeclarationFile::from_str(
        r#"
[[dependencies]]
module = "org.example:lib:1.0"
files = ["a.jar"]
"#,
    )
    .unwrap();
    let err = file.to_dependency_set().unwrap_err();
    assert!(err.to_string().contains("dependencies[0]"), "got: {err}");
}

#[test]
fn test_scopes_and_mapping_together_is_rejected() {
    let file = DeclarationFile::from_str(
        r#"
[[dependencies]]
module = "org.example:lib:1.0"
scopes = ["compile"]
mapping = { compile = ["default"] }
"#,
    )
    .unwrap();
    assert!(file.to_dependency_set().is_err());
}

#[test]
fn test_invalid_toml_is_rejected() {
    assert!(DeclarationFile::from_str("[[dependencies]\n").is_err());
}

#[test]
fn test_empty_file_has_no_module() {
    let file = DeclarationFile::from_str("").unwrap();
    assert!(file.module().unwrap().is_none());
    assert!(file.to_dependency_set().unwrap().is_empty());
}
