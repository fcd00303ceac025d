use crate::model::{KindSelector, MatchRule, Resource};
use crate::registry::{TemplateRegistry, TemplateSource};
use crate::schema::RawParamSpec;
use crate::store::{ConstraintSource, ConstraintStore};
use serde_json::{Value, json};
use std::collections::BTreeMap;

pub const REQUIRED_LABELS_POLICY: &str = r#"
package k8srequiredlabels

violation {
  some label in parameters.labels
  not input.review.object.metadata.labels[label]
  msg := sprintf("missing required label: %v", [label])
  path := ["metadata", "labels", label]
}
"#;

pub fn required_labels_template() -> TemplateSource {
    let mut schema = BTreeMap::new();
    schema.insert("labels".to_string(), RawParamSpec::required("string-array"));
    TemplateSource {
        kind: "K8sRequiredLabels".to_string(),
        parameter_schema: schema,
        policy_body: REQUIRED_LABELS_POLICY.to_string(),
    }
}

pub fn registry_with_required_labels() -> TemplateRegistry {
    let mut registry = TemplateRegistry::new();
    registry
        .register_source(required_labels_template())
        .expect("template registers");
    registry
}

pub fn required_labels_constraint(name: &str, labels: Value) -> ConstraintSource {
    ConstraintSource {
        name: name.to_string(),
        template_kind: "K8sRequiredLabels".to_string(),
        match_rule: MatchRule {
            kinds: vec![KindSelector::new("", "Pod")],
            namespaces: Vec::new(),
            excluded_namespaces: vec!["kube-system".to_string()],
        },
        parameters: json!({ "labels": labels }),
    }
}

/// Registry and store holding a single required-labels constraint.
pub fn store_with(name: &str, labels: Value) -> (TemplateRegistry, ConstraintStore) {
    let registry = registry_with_required_labels();
    let mut store = ConstraintStore::new();
    store
        .add(&registry, required_labels_constraint(name, labels))
        .expect("constraint adds");
    (registry, store)
}

pub fn pod(name: &str, namespace: Option<&str>, labels: Value) -> Resource {
    let mut object = json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": { "name": name, "labels": labels },
    });
    if let Some(ns) = namespace {
        object["metadata"]["namespace"] = json!(ns);
    }
    Resource::from_object(object)
}
