use crate::model::{KindSelector, MatchRule, Resource};
use crate::store::Constraint;

const WILDCARD: &str = "*";

/// Whether `constraint` applies to `resource`.
pub fn matches(constraint: &Constraint, resource: &Resource) -> bool {
    rule_matches(&constraint.match_rule, resource)
}

/// Match a bare rule.
///
/// - an empty kinds list matches every kind
/// - excluded namespaces win over included ones
/// - an empty namespaces list matches every namespace
/// - cluster-scoped resources pass both namespace filters
pub fn rule_matches(rule: &MatchRule, resource: &Resource) -> bool {
    if !rule.kinds.is_empty() && !rule.kinds.iter().any(|k| selector_matches(k, resource)) {
        return false;
    }

    let Some(namespace) = resource.namespace.as_deref() else {
        return true;
    };
    if rule.excluded_namespaces.iter().any(|ns| ns == namespace) {
        return false;
    }
    rule.namespaces.is_empty() || rule.namespaces.iter().any(|ns| ns == namespace)
}

fn selector_matches(selector: &KindSelector, resource: &Resource) -> bool {
    let group_ok = selector.api_group == WILDCARD || selector.api_group == resource.api_group;
    let kind_ok = selector.kind == WILDCARD || selector.kind == resource.kind;
    group_ok && kind_ok
}
