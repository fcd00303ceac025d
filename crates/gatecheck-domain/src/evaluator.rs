use crate::error::EvalError;
use crate::model::{Resource, Violation};
use crate::policy::EvalOptions;
use crate::store::Constraint;
use serde_json::json;

const LOG_TARGET: &str = "gatecheck::eval";

/// Evaluate a constraint's policy against one resource.
///
/// The policy sees `input.review` (the admission review envelope) and
/// `input.parameters`; `parameters` is also bound directly. Pure and
/// idempotent: the same inputs always give the same violations.
pub fn evaluate(
    constraint: &Constraint,
    resource: &Resource,
    options: &EvalOptions,
) -> Result<Vec<Violation>, EvalError> {
    let input = json!({
        "review": resource.review(),
        "parameters": constraint.parameters,
    });
    let violations = constraint
        .template
        .policy
        .evaluate(&input, &constraint.parameters, options)?;
    log::trace!(
        target: LOG_TARGET,
        "{} on {}/{}: {} violation(s)",
        constraint.name,
        resource.kind,
        resource.name.as_deref().unwrap_or("<unnamed>"),
        violations.len()
    );
    Ok(violations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{pod, store_with};
    use serde_json::json;

    #[test]
    fn evaluation_is_idempotent() {
        let (_, store) = store_with("must-have-owner", json!(["owner", "team"]));
        let constraint = store.get("must-have-owner").expect("constraint");
        let resource = pod("web", Some("default"), json!({ "app": "web" }));

        let first = evaluate(&constraint, &resource, &EvalOptions::default()).expect("eval");
        let second = evaluate(&constraint, &resource, &EvalOptions::default()).expect("eval");
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn review_envelope_is_visible() {
        let (_, store) = store_with("c", json!(["owner"]));
        let constraint = store.get("c").expect("constraint");
        let resource = pod("web", Some("default"), json!({ "owner": "me" }));
        let out = evaluate(&constraint, &resource, &EvalOptions::default()).expect("eval");
        assert!(out.is_empty());
    }
}
