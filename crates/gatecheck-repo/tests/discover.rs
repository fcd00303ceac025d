//! Integration tests for suite discovery and loading against the shared fixtures.
//!
//! These tests verify that discovery produces a stable, deterministic ordering of
//! suite files and that every fixture suite loads (or fails) the way it should.

use camino::Utf8PathBuf;
use gatecheck_domain::EngineError;
use gatecheck_repo::{discover_suites, load_suite};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::PathBuf;

/// Get the path to the test fixtures directory (repo root / tests / fixtures).
fn fixtures_dir() -> Utf8PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    // crates/gatecheck-repo -> crates -> repo root
    let repo_root = manifest_dir
        .parent()
        .expect("gatecheck-repo should have parent (crates)")
        .parent()
        .expect("crates should have parent (repo root)");
    Utf8PathBuf::from_path_buf(repo_root.join("tests").join("fixtures"))
        .expect("fixture path should be valid UTF-8")
}

fn globs(patterns: &[&str]) -> GlobSet {
    let mut b = GlobSetBuilder::new();
    for p in patterns {
        b.add(Glob::new(p).expect("glob"));
    }
    b.build().expect("globset")
}

fn default_patterns() -> GlobSet {
    globs(&["**/suite.yaml", "**/suite.yml", "**/*.suite.yaml"])
}

fn engine_error(err: &anyhow::Error) -> Option<&EngineError> {
    err.chain().find_map(|e| e.downcast_ref::<EngineError>())
}

#[test]
fn suite_ordering_is_deterministic() {
    let root = fixtures_dir();
    let first = discover_suites(&root, &default_patterns(), &globs(&[])).expect("discover");
    let second = discover_suites(&root, &default_patterns(), &globs(&[])).expect("discover");
    assert_eq!(first, second);

    let actual: Vec<String> = first
        .iter()
        .map(|p| p.strip_prefix(&root).expect("under root").as_str().to_string())
        .collect();
    assert_eq!(
        actual,
        vec![
            "container_limits/suite.yaml",
            "exact_count/suite.yaml",
            "missing_reference/suite.yaml",
            "namespace_exclusion/suite.yaml",
            "required_labels/suite.yaml",
            "schema_mismatch/suite.yaml",
        ]
    );
}

#[test]
fn templates_and_objects_are_not_suites() {
    let found = discover_suites(
        &fixtures_dir().join("shared"),
        &default_patterns(),
        &globs(&[]),
    )
    .expect("discover");
    assert!(found.is_empty());
}

#[test]
fn exclude_patterns_drop_structural_fixtures() {
    let found = discover_suites(
        &fixtures_dir(),
        &default_patterns(),
        &globs(&["missing_reference/**", "schema_mismatch/**"]),
    )
    .expect("discover");
    assert_eq!(found.len(), 4);
}

#[test]
fn passing_fixtures_load() {
    for name in [
        "required_labels",
        "namespace_exclusion",
        "exact_count",
        "container_limits",
    ] {
        let loaded = load_suite(&fixtures_dir().join(name).join("suite.yaml"))
            .unwrap_or_else(|e| panic!("fixture '{name}' failed to load: {e:#}"));
        assert_eq!(loaded.registry.len(), 1, "fixture '{name}'");
        assert_eq!(loaded.store.len(), 1, "fixture '{name}'");
        assert!(!loaded.suite.tests.is_empty(), "fixture '{name}'");
    }
}

#[test]
fn shared_template_is_loaded_once_per_suite() {
    let loaded =
        load_suite(&fixtures_dir().join("required_labels/suite.yaml")).expect("load");
    assert_eq!(
        loaded.registry.kinds().collect::<Vec<_>>(),
        vec!["K8sRequiredLabels"]
    );
}

#[test]
fn missing_reference_fixture_fails_with_path_resolution() {
    let err = load_suite(&fixtures_dir().join("missing_reference/suite.yaml")).unwrap_err();
    assert!(matches!(
        engine_error(&err),
        Some(EngineError::PathResolution { .. })
    ));
}

#[test]
fn schema_mismatch_fixture_fails_with_schema_mismatch() {
    let err = load_suite(&fixtures_dir().join("schema_mismatch/suite.yaml")).unwrap_err();
    assert!(matches!(
        engine_error(&err),
        Some(EngineError::SchemaMismatch { constraint, .. }) if constraint == "labels-as-string"
    ));
}
