//! Explain registry for error codes and assertion kinds.
//!
//! Maps identifiers to human-readable explanations with remediation guidance.

use crate::ids;

/// Explanation entry for an error code or assertion kind.
#[derive(Debug, Clone)]
pub struct Explanation {
    /// Short description of the code.
    pub title: &'static str,
    /// What the code means and when it is raised.
    pub description: &'static str,
    /// How to fix it.
    pub remediation: &'static str,
    /// Before/after document examples.
    pub examples: ExamplePair,
}

/// Before and after YAML examples.
#[derive(Debug, Clone)]
pub struct ExamplePair {
    /// A document that triggers the code.
    pub before: &'static str,
    /// The corrected document.
    pub after: &'static str,
}

/// Look up an explanation by error code or assertion kind.
///
/// Returns `None` if the identifier is not recognized.
pub fn lookup_explanation(identifier: &str) -> Option<Explanation> {
    match identifier {
        ids::CODE_CONFLICT => Some(explain_conflict()),
        ids::CODE_NOT_FOUND => Some(explain_not_found()),
        ids::CODE_SCHEMA_MISMATCH => Some(explain_schema_mismatch()),
        ids::CODE_COMPILE_ERROR => Some(explain_compile_error()),
        ids::CODE_PATH_RESOLUTION => Some(explain_path_resolution()),
        ids::CODE_ASSERTION_FAILURE => Some(explain_assertion_failure()),
        ids::CODE_BUDGET_EXCEEDED => Some(explain_budget_exceeded()),

        ids::ASSERT_VIOLATIONS_NO => Some(explain_assert_no()),
        ids::ASSERT_VIOLATIONS_YES => Some(explain_assert_yes()),
        ids::ASSERT_VIOLATIONS_COUNT => Some(explain_assert_count()),
        ids::ASSERT_MESSAGE => Some(explain_assert_message()),

        _ => None,
    }
}

/// List all known error codes.
pub fn all_codes() -> &'static [&'static str] {
    &[
        ids::CODE_CONFLICT,
        ids::CODE_NOT_FOUND,
        ids::CODE_SCHEMA_MISMATCH,
        ids::CODE_COMPILE_ERROR,
        ids::CODE_PATH_RESOLUTION,
        ids::CODE_ASSERTION_FAILURE,
        ids::CODE_BUDGET_EXCEEDED,
    ]
}

/// List all known assertion kinds.
pub fn all_assertion_kinds() -> &'static [&'static str] {
    &[
        ids::ASSERT_VIOLATIONS_NO,
        ids::ASSERT_VIOLATIONS_YES,
        ids::ASSERT_VIOLATIONS_COUNT,
        ids::ASSERT_MESSAGE,
    ]
}

// --- Structural errors ---

fn explain_conflict() -> Explanation {
    Explanation {
        title: "Duplicate Registration",
        description: "\
Two different documents in the same suite declare the same template kind or the
same constraint name.

Templates and constraints are registered once per suite run. A file referenced
by several tests is loaded a single time, but a second file that reuses an
already registered identifier is rejected and the suite is not run.",
        remediation: "\
Give every template a unique `kind` and every constraint a unique `name`, or
point all tests at the same file.",
        examples: ExamplePair {
            before: r#"# templates/a.yaml
kind: K8sRequiredLabels
# templates/b.yaml
kind: K8sRequiredLabels"#,
            after: r#"# templates/a.yaml
kind: K8sRequiredLabels
# templates/b.yaml
kind: K8sRequiredAnnotations"#,
        },
    }
}

fn explain_not_found() -> Explanation {
    Explanation {
        title: "Unresolved Reference",
        description: "\
A constraint names a template kind that has not been registered, or a test
names a constraint that does not exist.",
        remediation: "\
Make sure `templateKind` in the constraint matches the `kind` of the template
used by the same test.",
        examples: ExamplePair {
            before: r#"name: must-have-owner
templateKind: K8sRequiredLabel"#,
            after: r#"name: must-have-owner
templateKind: K8sRequiredLabels"#,
        },
    }
}

fn explain_schema_mismatch() -> Explanation {
    Explanation {
        title: "Parameter Schema Mismatch",
        description: "\
A constraint's parameters do not satisfy the template's `parameterSchema`.

Parameters are type-checked once, when the constraint is added. A value of the
wrong type, a missing required field, or a field the schema does not declare
all reject the constraint. Policies can therefore rely on parameter types
without re-checking them.",
        remediation: "\
Supply every required field with the declared type: `string`, `string-array`,
`int`, `bool` or `object`. Mark optional fields with `required: false`.",
        examples: ExamplePair {
            before: r#"# template: parameterSchema: { labels: string-array }
parameters:
  labels: owner"#,
            after: r#"parameters:
  labels: ["owner"]"#,
        },
    }
}

fn explain_compile_error() -> Explanation {
    Explanation {
        title: "Policy Compile Error",
        description: "\
A template's `policyBody` could not be compiled. Compilation happens once, at
registration, so a malformed policy never reaches evaluation.

Besides syntax errors this covers unbound variables, unknown functions, wrong
builtin arity, rebinding a name, recursive helpers, and violation rules that
never bind `msg`.",
        remediation: "\
Read the line and column in the message. Every `violation` rule must assign
`msg := ...`; variables must be introduced with `some` or `:=` before use.",
        examples: ExamplePair {
            before: r#"policyBody: |
  violation {
    not input.review.object.metadata.labels.owner
  }"#,
            after: r#"policyBody: |
  violation {
    not input.review.object.metadata.labels.owner
    msg := "missing owner label"
  }"#,
        },
    }
}

fn explain_path_resolution() -> Explanation {
    Explanation {
        title: "Reference Path Not Found",
        description: "\
A `templateRef`, `constraintRef` or `objectRef` points to a file that does not
exist. References are resolved relative to the directory containing the suite
document.",
        remediation: "\
Fix the relative path, or move the referenced file next to the suite.",
        examples: ExamplePair {
            before: r#"# suites/labels/suite.yaml
templateRef: template.yaml   # file lives in templates/"#,
            after: r#"# suites/labels/suite.yaml
templateRef: ../../templates/template.yaml"#,
        },
    }
}

fn explain_assertion_failure() -> Explanation {
    Explanation {
        title: "Assertion Failure",
        description: "\
A case produced a violation set that does not satisfy one of its assertions.

Assertion failures are recorded per case and never stop the run; every other
case is still evaluated and the report lists expected versus actual values.",
        remediation: "\
Either the policy is wrong or the expectation is. Run with `--verbose` to see
every violation message the case produced.",
        examples: ExamplePair {
            before: r#"assertions:
  - violations: no   # but the object has no labels"#,
            after: r#"assertions:
  - violations: yes
    message: owner"#,
        },
    }
}

fn explain_budget_exceeded() -> Explanation {
    Explanation {
        title: "Evaluation Budget Exceeded",
        description: "\
The policy ran out of evaluation steps for a single object. This bounds
pathological policies (deep nested iteration over large objects). The case is
reported as failed.",
        remediation: "\
Narrow the iteration in the policy, or raise `max_eval_steps` in
gatecheck.toml (or `--max-eval-steps`).",
        examples: ExamplePair {
            before: r#"max_eval_steps = 1000"#,
            after: r#"max_eval_steps = 1000000"#,
        },
    }
}

// --- Assertion kinds ---

fn explain_assert_no() -> Explanation {
    Explanation {
        title: "Expect No Violations",
        description: "\
`violations: no` passes when the case produced zero violations. Objects that
the constraint does not match always produce zero violations.",
        remediation: "Use this for compliant sample objects.",
        examples: ExamplePair {
            before: r#"assertions:
  - violations: 0"#,
            after: r#"assertions:
  - violations: no"#,
        },
    }
}

fn explain_assert_yes() -> Explanation {
    Explanation {
        title: "Expect Violations",
        description: "\
`violations: yes` passes when the case produced at least one violation.",
        remediation: "\
Add `message:` to pin down which rule should fire.",
        examples: ExamplePair {
            before: r#"assertions:
  - violations: yes"#,
            after: r#"assertions:
  - violations: yes
    message: owner"#,
        },
    }
}

fn explain_assert_count() -> Explanation {
    Explanation {
        title: "Expect Exact Violation Count",
        description: "\
`violations: N` passes when the case produced exactly N violations, counted
over the complete violation set. Fewer or more both fail.",
        remediation: "\
Count one violation per rule branch that fires; identical violations are
reported once.",
        examples: ExamplePair {
            before: r#"assertions:
  - violations: yes"#,
            after: r#"assertions:
  - violations: 2"#,
        },
    }
}

fn explain_assert_message() -> Explanation {
    Explanation {
        title: "Expect Violation Message",
        description: "\
`message: text` narrows an assertion to violations whose message contains the
substring. With `violations: yes` at least one must match; with
`violations: N` exactly N must match; with `violations: no` none may match.",
        remediation: "Pick a substring that is stable across wording changes.",
        examples: ExamplePair {
            before: r#"assertions:
  - violations: yes"#,
            after: r#"assertions:
  - violations: yes
    message: "missing required label""#,
        },
    }
}
