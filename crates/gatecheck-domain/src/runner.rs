//! Suite runner: match, evaluate and assert every case of a suite.

use crate::error::{EngineError, EvalError};
use crate::evaluator::evaluate;
use crate::matcher::matches;
use crate::model::{Assertion, Case, Expectation, Suite, Test, Violation};
use crate::policy::EvalOptions;
use crate::registry::TemplateRegistry;
use crate::store::{Constraint, ConstraintStore};
use gatecheck_types::CaseStatus;
use rayon::prelude::*;
use regex::Regex;
use std::sync::Arc;

const LOG_TARGET: &str = "gatecheck::runner";

#[derive(Clone, Debug)]
pub struct RunOptions {
    /// Run tests on the rayon pool. Outcome order never changes.
    pub parallel: bool,
    pub eval: EvalOptions,
    /// Only cases whose `test/case` name matches run; the rest are skipped.
    pub filter: Option<Regex>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            eval: EvalOptions::default(),
            filter: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssertionFailure {
    /// Index of the assertion within its case.
    pub assertion: usize,
    pub expected: String,
    pub actual: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaseOutcome {
    pub name: String,
    pub status: CaseStatus,
    /// `false` when the constraint does not apply; the policy was not run.
    pub matched: bool,
    pub violations: Vec<Violation>,
    pub failures: Vec<AssertionFailure>,
    pub error: Option<EvalError>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestOutcome {
    pub name: String,
    pub template_kind: String,
    pub constraint_name: String,
    pub cases: Vec<CaseOutcome>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuiteOutcome {
    pub name: String,
    pub path: Option<String>,
    pub tests: Vec<TestOutcome>,
}

impl SuiteOutcome {
    pub fn cases(&self) -> impl Iterator<Item = &CaseOutcome> {
        self.tests.iter().flat_map(|t| t.cases.iter())
    }

    pub fn count(&self, status: CaseStatus) -> usize {
        self.cases().filter(|c| c.status == status).count()
    }

    pub fn passed(&self) -> bool {
        self.count(CaseStatus::Fail) == 0
    }
}

/// Run every case of `suite`.
///
/// References are resolved up front: a missing template or constraint, or a
/// constraint bound to a different template than the test names, is a
/// structural error and nothing runs. Case failures never stop the run.
pub fn run_suite(
    suite: &Suite,
    registry: &TemplateRegistry,
    store: &ConstraintStore,
    options: &RunOptions,
) -> Result<SuiteOutcome, EngineError> {
    let resolved = suite
        .tests
        .iter()
        .map(|test| resolve(test, registry, store).map(|c| (test, c)))
        .collect::<Result<Vec<_>, _>>()?;

    log::debug!(
        target: LOG_TARGET,
        "running suite {} ({} test(s), parallel={})",
        suite.name,
        resolved.len(),
        options.parallel
    );

    let tests: Vec<TestOutcome> = if options.parallel {
        resolved
            .par_iter()
            .map(|(test, constraint)| run_test(test, constraint, options))
            .collect()
    } else {
        resolved
            .iter()
            .map(|(test, constraint)| run_test(test, constraint, options))
            .collect()
    };

    Ok(SuiteOutcome {
        name: suite.name.clone(),
        path: suite.path.clone(),
        tests,
    })
}

fn resolve(
    test: &Test,
    registry: &TemplateRegistry,
    store: &ConstraintStore,
) -> Result<Arc<Constraint>, EngineError> {
    registry.lookup(&test.template_kind)?;
    let constraint = store.get(&test.constraint_name)?;
    if constraint.template_kind() != test.template_kind {
        return Err(EngineError::TemplateMismatch {
            test: test.name.clone(),
            constraint: constraint.name.clone(),
            expected: test.template_kind.clone(),
            actual: constraint.template_kind().to_string(),
        });
    }
    Ok(constraint)
}

fn run_test(test: &Test, constraint: &Constraint, options: &RunOptions) -> TestOutcome {
    let cases = test
        .cases
        .iter()
        .map(|case| {
            let selected = options
                .filter
                .as_ref()
                .is_none_or(|re| re.is_match(&format!("{}/{}", test.name, case.name)));
            if selected {
                run_case(case, constraint, &options.eval)
            } else {
                skipped(case)
            }
        })
        .collect();

    TestOutcome {
        name: test.name.clone(),
        template_kind: test.template_kind.clone(),
        constraint_name: test.constraint_name.clone(),
        cases,
    }
}

fn skipped(case: &Case) -> CaseOutcome {
    CaseOutcome {
        name: case.name.clone(),
        status: CaseStatus::Skip,
        matched: false,
        violations: Vec::new(),
        failures: Vec::new(),
        error: None,
    }
}

/// Run one case: match, evaluate if matched, then check every assertion.
pub fn run_case(case: &Case, constraint: &Constraint, options: &EvalOptions) -> CaseOutcome {
    let matched = matches(constraint, &case.resource);
    let violations = if matched {
        match evaluate(constraint, &case.resource, options) {
            Ok(v) => v,
            Err(err) => {
                log::warn!(target: LOG_TARGET, "case {}: {err}", case.name);
                return CaseOutcome {
                    name: case.name.clone(),
                    status: CaseStatus::Fail,
                    matched,
                    violations: Vec::new(),
                    failures: Vec::new(),
                    error: Some(err),
                };
            }
        }
    } else {
        Vec::new()
    };

    let failures: Vec<AssertionFailure> = case
        .assertions
        .iter()
        .enumerate()
        .filter_map(|(idx, assertion)| check_assertion(idx, assertion, &violations))
        .collect();

    let status = if failures.is_empty() {
        CaseStatus::Pass
    } else {
        CaseStatus::Fail
    };

    CaseOutcome {
        name: case.name.clone(),
        status,
        matched,
        violations,
        failures,
        error: None,
    }
}

/// Compare one assertion against the complete violation set.
pub fn check_assertion(
    index: usize,
    assertion: &Assertion,
    violations: &[Violation],
) -> Option<AssertionFailure> {
    let relevant = violations
        .iter()
        .filter(|v| {
            assertion
                .message
                .as_deref()
                .is_none_or(|needle| v.message.contains(needle))
        })
        .count();

    let ok = match assertion.expect {
        Expectation::No => relevant == 0,
        Expectation::Yes => relevant >= 1,
        Expectation::Exactly(n) => relevant == n,
    };
    if ok {
        return None;
    }

    let suffix = match &assertion.message {
        Some(m) => format!(" matching {m:?}"),
        None => String::new(),
    };
    let expected = match assertion.expect {
        Expectation::No => format!("no violations{suffix}"),
        Expectation::Yes => format!("at least one violation{suffix}"),
        Expectation::Exactly(n) => format!("{}{suffix}", violations_phrase(n)),
    };
    Some(AssertionFailure {
        assertion: index,
        expected,
        actual: format!("{}{suffix}", violations_phrase(relevant)),
    })
}

fn violations_phrase(n: usize) -> String {
    if n == 1 {
        "1 violation".to_string()
    } else {
        format!("{n} violations")
    }
}
