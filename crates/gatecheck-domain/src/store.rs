//! Constraint store: validated constraints keyed by name.

use crate::error::{Entity, EngineError};
use crate::model::{MatchRule, empty_parameters};
use crate::registry::{Template, TemplateRegistry};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

const LOG_TARGET: &str = "gatecheck::store";

/// Constraint as declared in a document.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstraintSource {
    pub name: String,
    pub template_kind: String,
    pub match_rule: MatchRule,
    /// JSON object; `Null` means no parameters.
    pub parameters: Value,
}

/// A constraint bound to its template, with parameters already validated.
#[derive(Debug)]
pub struct Constraint {
    pub name: String,
    pub template: Arc<Template>,
    pub match_rule: MatchRule,
    pub parameters: Value,
}

impl Constraint {
    pub fn template_kind(&self) -> &str {
        &self.template.kind
    }
}

#[derive(Debug, Default)]
pub struct ConstraintStore {
    constraints: BTreeMap<String, Arc<Constraint>>,
}

impl ConstraintStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the template, type-check the parameters and insert.
    ///
    /// The store is unchanged when this returns an error.
    pub fn add(
        &mut self,
        registry: &TemplateRegistry,
        src: ConstraintSource,
    ) -> Result<Arc<Constraint>, EngineError> {
        let template = registry.lookup(&src.template_kind)?;
        template.schema.validate(&src.name, &src.parameters)?;
        if self.constraints.contains_key(&src.name) {
            return Err(EngineError::Conflict {
                entity: Entity::Constraint,
                name: src.name,
            });
        }

        let parameters = match src.parameters {
            Value::Null => empty_parameters(),
            other => other,
        };
        let constraint = Arc::new(Constraint {
            name: src.name,
            template,
            match_rule: src.match_rule,
            parameters,
        });
        self.constraints
            .insert(constraint.name.clone(), Arc::clone(&constraint));
        log::debug!(
            target: LOG_TARGET,
            "added constraint {} ({})",
            constraint.name,
            constraint.template_kind()
        );
        Ok(constraint)
    }

    pub fn get(&self, name: &str) -> Result<Arc<Constraint>, EngineError> {
        self.constraints
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::NotFound {
                entity: Entity::Constraint,
                name: name.to_string(),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constraints.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{registry_with_required_labels, required_labels_constraint};
    use serde_json::json;

    #[test]
    fn add_and_get() {
        let registry = registry_with_required_labels();
        let mut store = ConstraintStore::new();
        let added = store
            .add(&registry, required_labels_constraint("must-have-owner", json!(["owner"])))
            .expect("adds");
        assert_eq!(added.template_kind(), "K8sRequiredLabels");
        let got = store.get("must-have-owner").expect("found");
        assert!(Arc::ptr_eq(&added, &got));
    }

    #[test]
    fn unknown_template_is_not_found() {
        let registry = TemplateRegistry::new();
        let mut store = ConstraintStore::new();
        let err = store
            .add(&registry, required_labels_constraint("c", json!(["owner"])))
            .unwrap_err();
        assert_eq!(err.to_string(), "template 'K8sRequiredLabels' not found");
        assert!(store.is_empty());
    }

    #[test]
    fn schema_mismatch_leaves_store_unchanged() {
        let registry = registry_with_required_labels();
        let mut store = ConstraintStore::new();
        store
            .add(&registry, required_labels_constraint("ok", json!(["owner"])))
            .expect("adds");

        let err = store
            .add(&registry, required_labels_constraint("bad", json!("owner")))
            .unwrap_err();
        assert!(matches!(err, EngineError::SchemaMismatch { ref field, .. } if field == "labels"));
        assert_eq!(store.names().collect::<Vec<_>>(), vec!["ok"]);
        assert!(store.get("bad").is_err());
    }

    #[test]
    fn duplicate_name_conflicts() {
        let registry = registry_with_required_labels();
        let mut store = ConstraintStore::new();
        store
            .add(&registry, required_labels_constraint("c", json!(["owner"])))
            .expect("adds");
        let err = store
            .add(&registry, required_labels_constraint("c", json!(["team"])))
            .unwrap_err();
        assert_eq!(err.to_string(), "constraint 'c' is already registered");
        assert_eq!(store.get("c").expect("kept").parameters["labels"], json!(["owner"]));
    }

    #[test]
    fn missing_constraint_is_not_found() {
        let store = ConstraintStore::new();
        assert_eq!(
            store.get("nope").unwrap_err().to_string(),
            "constraint 'nope' not found"
        );
    }
}
