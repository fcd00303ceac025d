//! Template registry: compiled templates keyed by kind.

use crate::error::{Entity, EngineError};
use crate::policy::{self, Policy};
use crate::schema::{ParameterSchema, RawParamSpec};
use std::collections::BTreeMap;
use std::sync::Arc;

const LOG_TARGET: &str = "gatecheck::registry";

/// Template as declared in a document, before compilation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateSource {
    pub kind: String,
    pub parameter_schema: BTreeMap<String, RawParamSpec>,
    pub policy_body: String,
}

/// A compiled, immutable template.
#[derive(Debug)]
pub struct Template {
    pub kind: String,
    pub schema: ParameterSchema,
    pub policy: Policy,
    pub source: String,
}

impl Template {
    /// Parse the schema and compile the policy body.
    pub fn compile(src: TemplateSource) -> Result<Self, EngineError> {
        let compile_error = |source| EngineError::Compile {
            kind: src.kind.clone(),
            source,
        };
        let schema = ParameterSchema::compile(&src.parameter_schema).map_err(compile_error)?;
        let policy = policy::compile(&src.policy_body).map_err(compile_error)?;
        log::debug!(
            target: LOG_TARGET,
            "compiled template {} ({} rule(s))",
            src.kind,
            policy.rule_count()
        );
        Ok(Self {
            kind: src.kind,
            schema,
            policy,
            source: src.policy_body,
        })
    }
}

#[derive(Debug, Default)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, Arc<Template>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a compiled template. An existing kind is left untouched.
    pub fn register(&mut self, template: Template) -> Result<Arc<Template>, EngineError> {
        if self.templates.contains_key(&template.kind) {
            return Err(EngineError::Conflict {
                entity: Entity::Template,
                name: template.kind,
            });
        }
        let template = Arc::new(template);
        self.templates
            .insert(template.kind.clone(), Arc::clone(&template));
        log::debug!(target: LOG_TARGET, "registered template {}", template.kind);
        Ok(template)
    }

    /// Compile and register in one step.
    pub fn register_source(&mut self, src: TemplateSource) -> Result<Arc<Template>, EngineError> {
        if self.templates.contains_key(&src.kind) {
            return Err(EngineError::Conflict {
                entity: Entity::Template,
                name: src.kind,
            });
        }
        self.register(Template::compile(src)?)
    }

    pub fn lookup(&self, kind: &str) -> Result<Arc<Template>, EngineError> {
        self.templates
            .get(kind)
            .cloned()
            .ok_or_else(|| EngineError::NotFound {
                entity: Entity::Template,
                name: kind.to_string(),
            })
    }

    /// Remove a template so its kind can be registered again. Constraints
    /// already bound to it keep their handle.
    pub fn remove(&mut self, kind: &str) -> Result<Arc<Template>, EngineError> {
        self.templates
            .remove(kind)
            .ok_or_else(|| EngineError::NotFound {
                entity: Entity::Template,
                name: kind.to_string(),
            })
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileError;
    use crate::test_support::required_labels_template;

    #[test]
    fn register_then_lookup() {
        let mut registry = TemplateRegistry::new();
        let registered = registry
            .register_source(required_labels_template())
            .expect("registers");
        let found = registry.lookup("K8sRequiredLabels").expect("found");
        assert!(Arc::ptr_eq(&registered, &found));
        assert_eq!(registry.kinds().collect::<Vec<_>>(), vec!["K8sRequiredLabels"]);
    }

    #[test]
    fn duplicate_kind_conflicts_and_keeps_original() {
        let mut registry = TemplateRegistry::new();
        let original = registry
            .register_source(required_labels_template())
            .expect("registers");

        let mut other = required_labels_template();
        other.policy_body = "violation { msg := \"other\" }".to_string();
        let err = registry.register_source(other).unwrap_err();
        assert_eq!(
            err,
            EngineError::Conflict {
                entity: Entity::Template,
                name: "K8sRequiredLabels".to_string()
            }
        );

        let still = registry.lookup("K8sRequiredLabels").expect("found");
        assert!(Arc::ptr_eq(&original, &still));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn remove_allows_reregistration() {
        let mut registry = TemplateRegistry::new();
        registry
            .register_source(required_labels_template())
            .expect("registers");
        registry.remove("K8sRequiredLabels").expect("removed");
        assert!(registry.is_empty());
        assert!(matches!(
            registry.remove("K8sRequiredLabels"),
            Err(EngineError::NotFound { .. })
        ));
        registry
            .register_source(required_labels_template())
            .expect("registers again");
    }

    #[test]
    fn lookup_missing_kind() {
        let registry = TemplateRegistry::new();
        let err = registry.lookup("Nope").unwrap_err();
        assert_eq!(err.to_string(), "template 'Nope' not found");
    }

    #[test]
    fn compile_errors_surface_at_registration() {
        let mut src = required_labels_template();
        src.policy_body = "violation {\n  msg := missing\n}".to_string();
        let err = Template::compile(src).unwrap_err();
        let EngineError::Compile { kind, source } = err else {
            panic!("expected compile error");
        };
        assert_eq!(kind, "K8sRequiredLabels");
        assert!(matches!(source, CompileError::Policy { line: 2, .. }));

        let mut src = required_labels_template();
        src.parameter_schema
            .insert("n".to_string(), RawParamSpec::required("number"));
        assert!(matches!(
            Template::compile(src),
            Err(EngineError::Compile {
                source: CompileError::Schema { .. },
                ..
            })
        ));
    }
}
