//! Conformance tests for gatecheck.
//!
//! These tests validate:
//! 1. All error codes and assertion kinds have explanations
//! 2. All fixture reports validate against the generated report schema
//! 3. Fixture report summaries agree with their case statuses

use gatecheck_types::{VerificationReport, explain, ids};
use serde_json::Value;
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("gatecheck-cli should have parent")
        .parent()
        .expect("crates should have parent")
        .join("tests")
        .join("fixtures")
}

/// Every `expected.report.json` under the fixtures directory, sorted.
fn fixture_reports() -> Vec<(String, Value)> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(fixtures_dir()).expect("read fixtures dir") {
        let dir = entry.expect("dir entry").path();
        let path = dir.join("expected.report.json");
        if !path.exists() {
            continue;
        }
        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let text = std::fs::read_to_string(&path).expect("read expected report");
        let value: Value = serde_json::from_str(&text)
            .unwrap_or_else(|e| panic!("fixture '{name}' is not valid JSON: {e}"));
        out.push((name, value));
    }
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}

// =============================================================================
// Explanation Coverage Tests
// =============================================================================

#[test]
fn all_codes_have_explanations() {
    for code in explain::all_codes() {
        let exp = explain::lookup_explanation(code)
            .unwrap_or_else(|| panic!("Code '{}' has no explanation in registry", code));
        assert!(!exp.title.is_empty(), "Code '{}' has empty title", code);
        assert!(
            !exp.description.is_empty(),
            "Code '{}' has empty description",
            code
        );
        assert!(
            !exp.remediation.is_empty(),
            "Code '{}' has empty remediation",
            code
        );
    }
}

#[test]
fn all_assertion_kinds_have_explanations() {
    for kind in explain::all_assertion_kinds() {
        assert!(
            explain::lookup_explanation(kind).is_some(),
            "Assertion kind '{}' has no explanation in registry",
            kind
        );
        assert!(
            kind.starts_with("violations."),
            "Assertion kind '{}' should be namespaced under 'violations.'",
            kind
        );
    }
}

#[test]
fn codes_are_snake_case() {
    for code in explain::all_codes() {
        let valid_chars = code.chars().all(|c| c.is_ascii_lowercase() || c == '_');
        assert!(
            valid_chars,
            "Code '{}' should be snake_case (lowercase with underscores)",
            code
        );
    }
}

#[test]
fn structural_codes_are_documented() {
    for code in [
        ids::CODE_CONFLICT,
        ids::CODE_NOT_FOUND,
        ids::CODE_SCHEMA_MISMATCH,
        ids::CODE_COMPILE_ERROR,
        ids::CODE_PATH_RESOLUTION,
    ] {
        assert!(
            explain::all_codes().contains(&code),
            "Code '{}' missing from all_codes()",
            code
        );
    }
}

// =============================================================================
// Report Schema Conformance
// =============================================================================

#[test]
fn fixtures_exist() {
    assert!(
        fixture_reports().len() >= 4,
        "expected golden reports under tests/fixtures"
    );
}

#[test]
fn all_fixture_reports_validate_against_schema() {
    let schema = serde_json::to_value(schemars::schema_for!(VerificationReport))
        .expect("serialize schema");
    let validator = jsonschema::validator_for(&schema).expect("report schema compiles");

    for (name, report) in fixture_reports() {
        let errors: Vec<String> = validator
            .iter_errors(&report)
            .map(|e| e.to_string())
            .collect();
        assert!(
            errors.is_empty(),
            "fixture '{}' does not match the report schema:\n{}",
            name,
            errors.join("\n")
        );
    }
}

#[test]
fn all_fixture_reports_deserialize() {
    for (name, mut report) in fixture_reports() {
        // Placeholder timestamps are not RFC 3339.
        for key in ["started_at", "ended_at"] {
            report["run"][key] = Value::String("2026-01-01T00:00:00Z".to_string());
        }
        let parsed: Result<VerificationReport, _> = serde_json::from_value(report);
        assert!(
            parsed.is_ok(),
            "fixture '{}' failed to deserialize: {:?}",
            name,
            parsed.err()
        );
    }
}

#[test]
fn all_fixture_summaries_match_cases() {
    for (name, report) in fixture_reports() {
        let cases: Vec<&Value> = report["suites"]
            .as_array()
            .expect("suites array")
            .iter()
            .flat_map(|s| s["tests"].as_array().expect("tests array"))
            .flat_map(|t| t["cases"].as_array().expect("cases array"))
            .collect();
        let count = |status: &str| cases.iter().filter(|c| c["status"] == status).count() as u64;

        let summary = &report["summary"];
        assert_eq!(summary["cases"], cases.len() as u64, "fixture '{name}'");
        assert_eq!(summary["passed"], count("pass"), "fixture '{name}'");
        assert_eq!(summary["failed"], count("fail"), "fixture '{name}'");
        assert_eq!(summary["skipped"], count("skip"), "fixture '{name}'");

        let verdict = if count("fail") > 0 { "fail" } else { "pass" };
        assert_eq!(report["verdict"], verdict, "fixture '{name}'");
    }
}

#[test]
fn all_fixture_violations_have_fingerprints() {
    for (name, report) in fixture_reports() {
        let text = report.to_string();
        let violations: Vec<Value> = report["suites"]
            .as_array()
            .into_iter()
            .flatten()
            .flat_map(|s| s["tests"].as_array().cloned().unwrap_or_default())
            .flat_map(|t| t["cases"].as_array().cloned().unwrap_or_default())
            .flat_map(|c| c["violations"].as_array().cloned().unwrap_or_default())
            .collect();
        for v in violations {
            let fp = v["fingerprint"].as_str().unwrap_or_else(|| {
                panic!("fixture '{name}' has a violation without fingerprint: {text}")
            });
            assert_eq!(fp.len(), 64, "fixture '{name}'");
            assert!(fp.chars().all(|c| c.is_ascii_hexdigit()), "fixture '{name}'");
        }
    }
}
