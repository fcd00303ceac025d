//! Property-based tests for the domain crate.
//!
//! These tests use proptest to verify invariants around:
//! - Evaluation determinism and set semantics
//! - Matching short-circuits evaluation
//! - Registry and store atomicity on error

use crate::error::EngineError;
use crate::evaluator::evaluate;
use crate::model::{Assertion, Expectation};
use crate::policy::{self, EvalOptions};
use crate::registry::TemplateRegistry;
use crate::runner::{check_assertion, run_case};
use crate::store::ConstraintStore;
use crate::test_support::{
    pod, registry_with_required_labels, required_labels_constraint, required_labels_template,
};
use gatecheck_types::CaseStatus;
use proptest::prelude::*;
use serde_json::{Map, Value, json};
use std::collections::BTreeSet;

// ============================================================================
// Strategies for generating arbitrary values
// ============================================================================

/// Strategy for label keys (lowercase, DNS-ish).
fn arb_label() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9-]{0,11}").unwrap()
}

fn arb_labels() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(arb_label(), 0..6)
}

/// Strategy for a label map present on the object.
fn arb_label_map() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map(arb_label(), "[a-z]{1,8}", 0..6).prop_map(|m| {
        m.into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect()
    })
}

fn arb_namespace() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("default".to_string())),
        Just(Some("kube-system".to_string())),
        arb_label().prop_map(Some),
    ]
}

/// Arbitrary parameter values, most of which are not a string array.
fn arb_parameter_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[a-z]{0,8}".prop_map(Value::String),
        prop::collection::vec(any::<i64>(), 1..4).prop_map(|xs| json!(xs)),
        arb_labels().prop_map(|xs| json!(xs)),
    ]
}

fn expectation() -> impl Strategy<Value = Expectation> {
    prop_oneof![
        Just(Expectation::No),
        Just(Expectation::Yes),
        (0usize..5).prop_map(Expectation::Exactly),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Evaluating twice gives the same violations, one per distinct missing label.
    #[test]
    fn evaluation_is_deterministic(required in arb_labels(), present in arb_label_map()) {
        let registry = registry_with_required_labels();
        let mut store = ConstraintStore::new();
        let constraint = store
            .add(&registry, required_labels_constraint("c", json!(required)))
            .unwrap();
        let resource = pod("p", Some("default"), Value::Object(present.clone()));

        let first = evaluate(&constraint, &resource, &EvalOptions::default()).unwrap();
        let second = evaluate(&constraint, &resource, &EvalOptions::default()).unwrap();
        prop_assert_eq!(&first, &second);

        let missing: BTreeSet<&String> = required
            .iter()
            .filter(|l| !present.contains_key(*l))
            .collect();
        prop_assert_eq!(first.len(), missing.len());
    }

    /// Resources in an excluded namespace are never evaluated.
    #[test]
    fn unmatched_means_zero_violations(required in arb_labels(), ns in arb_namespace()) {
        let registry = registry_with_required_labels();
        let mut store = ConstraintStore::new();
        let constraint = store
            .add(&registry, required_labels_constraint("c", json!(required)))
            .unwrap();
        let resource = pod("p", ns.as_deref(), json!({}));
        let case = crate::model::Case {
            name: "x".to_string(),
            resource,
            assertions: Vec::new(),
        };

        let outcome = run_case(&case, &constraint, &EvalOptions::default());
        if !outcome.matched {
            prop_assert_eq!(ns.as_deref(), Some("kube-system"));
            prop_assert!(outcome.violations.is_empty());
        }
        prop_assert_eq!(outcome.status, CaseStatus::Pass);
    }

    /// A schema-violating constraint leaves the store exactly as it was.
    #[test]
    fn store_add_is_atomic(value in arb_parameter_value()) {
        let registry = registry_with_required_labels();
        let mut store = ConstraintStore::new();
        store
            .add(&registry, required_labels_constraint("existing", json!(["owner"])))
            .unwrap();

        let mut src = required_labels_constraint("new", json!([]));
        src.parameters = json!({ "labels": value });
        let is_string_array = src.parameters["labels"]
            .as_array()
            .is_some_and(|xs| xs.iter().all(Value::is_string));

        match store.add(&registry, src) {
            Ok(_) => prop_assert!(is_string_array),
            Err(err) => {
                prop_assert!(!is_string_array);
                let is_schema_mismatch = matches!(err, EngineError::SchemaMismatch { .. });
                prop_assert!(is_schema_mismatch);
                prop_assert_eq!(store.names().collect::<Vec<_>>(), vec!["existing"]);
            }
        }
    }

    /// Registering a kind twice conflicts and keeps the first template.
    #[test]
    fn registry_conflict_keeps_original(body in "[a-z ]{0,20}") {
        let mut registry = TemplateRegistry::new();
        let first = registry.register_source(required_labels_template()).unwrap();

        let mut again = required_labels_template();
        again.policy_body = format!("violation {{ msg := \"{body}\" }}");
        let is_conflict = matches!(
            registry.register_source(again),
            Err(EngineError::Conflict { .. })
        );
        prop_assert!(is_conflict);
        prop_assert!(std::sync::Arc::ptr_eq(&first, &registry.lookup("K8sRequiredLabels").unwrap()));
    }

    /// `yes` and `no` are complementary; an exact count passes only on equality.
    #[test]
    fn assertion_semantics(count in 0usize..5, expect in expectation()) {
        let violations: Vec<_> = (0..count)
            .map(|i| crate::model::Violation::new(format!("v{i}")))
            .collect();
        let failed = check_assertion(0, &Assertion::new(expect), &violations).is_some();
        let should_pass = match expect {
            Expectation::No => count == 0,
            Expectation::Yes => count > 0,
            Expectation::Exactly(n) => n == count,
        };
        prop_assert_eq!(failed, !should_pass);
    }

    /// The compiler rejects garbage with an error instead of panicking.
    #[test]
    fn compile_never_panics(src in "[a-z{}()\\[\\]:=!<>.,;\"0-9 \n_-]{0,64}") {
        let _ = policy::compile(&src);
    }

    /// Nesting depth beyond the parser limit is a compile error, never a crash.
    #[test]
    fn nesting_depth_is_bounded(depth in 0usize..2_000, open in prop::sample::select(vec!["(", "[", "-"])) {
        let close = match open {
            "(" => ")",
            "[" => "]",
            _ => "",
        };
        let src = format!(
            "violation {{ x := {}1{}; msg := \"m\" }}",
            open.repeat(depth),
            close.repeat(depth)
        );
        let result = policy::compile(&src);
        prop_assert_eq!(result.is_ok(), depth < 32, "depth {}", depth);
    }
}
