use anyhow::Context;
use gatecheck_domain::fingerprint::fingerprint_for_violation;
use gatecheck_domain::runner::{CaseOutcome, TestOutcome};
use gatecheck_domain::SuiteOutcome;
use gatecheck_render::{
    RenderableCase, RenderableFailure, RenderableReport, RenderableStatus, RenderableSuite,
    RenderableSummary, RenderableTest, RenderableViolation,
};
use gatecheck_types::{
    AssertionFailureRecord, CaseRecord, CaseStatus, SCHEMA_REPORT_V1, SuiteRecord, TestRecord,
    Verdict, VerificationReport, ViolationRecord,
};

/// Convert a suite outcome into its report record, fingerprinting every violation.
pub fn suite_record(outcome: SuiteOutcome) -> SuiteRecord {
    SuiteRecord {
        name: outcome.name,
        path: outcome.path,
        tests: outcome.tests.into_iter().map(test_record).collect(),
    }
}

fn test_record(test: TestOutcome) -> TestRecord {
    let cases = test
        .cases
        .into_iter()
        .map(|c| case_record(&test.template_kind, &test.constraint_name, c))
        .collect();
    TestRecord {
        name: test.name,
        template: test.template_kind,
        constraint: test.constraint_name,
        cases,
    }
}

fn case_record(template: &str, constraint: &str, case: CaseOutcome) -> CaseRecord {
    let violations = case
        .violations
        .into_iter()
        .map(|v| ViolationRecord {
            fingerprint: Some(fingerprint_for_violation(
                template,
                constraint,
                &case.name,
                &v.message,
                v.path.as_deref(),
            )),
            message: v.message,
            path: v.path,
            details: v.details,
        })
        .collect();
    CaseRecord {
        name: case.name,
        status: case.status,
        matched: case.matched,
        violations,
        failures: case
            .failures
            .into_iter()
            .map(|f| AssertionFailureRecord {
                assertion: f.assertion,
                expected: f.expected,
                actual: f.actual,
            })
            .collect(),
        error: case.error.map(|e| e.to_string()),
    }
}

pub fn parse_report_json(text: &str) -> anyhow::Result<VerificationReport> {
    let value: serde_json::Value = serde_json::from_str(text).context("parse report json")?;

    let schema = value
        .get("schema")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    if schema != SCHEMA_REPORT_V1 {
        anyhow::bail!("unknown report schema: {schema:?} (expected {SCHEMA_REPORT_V1})");
    }

    serde_json::from_value(value).context("parse gatecheck report")
}

pub fn serialize_report(report: &VerificationReport) -> anyhow::Result<Vec<u8>> {
    serde_json::to_vec_pretty(report).context("serialize report")
}

pub fn to_renderable(report: &VerificationReport) -> RenderableReport {
    let s = &report.summary;
    RenderableReport {
        verdict: match report.verdict {
            Verdict::Pass => RenderableStatus::Pass,
            Verdict::Fail => RenderableStatus::Fail,
        },
        summary: RenderableSummary {
            suites: s.suites,
            tests: s.tests,
            cases: s.cases,
            passed: s.passed,
            failed: s.failed,
            skipped: s.skipped,
        },
        suites: report.suites.iter().map(renderable_suite).collect(),
    }
}

fn renderable_suite(suite: &SuiteRecord) -> RenderableSuite {
    RenderableSuite {
        name: suite.name.clone(),
        path: suite.path.clone(),
        tests: suite
            .tests
            .iter()
            .map(|t| RenderableTest {
                name: t.name.clone(),
                template: t.template.clone(),
                constraint: t.constraint.clone(),
                cases: t.cases.iter().map(renderable_case).collect(),
            })
            .collect(),
    }
}

fn renderable_case(case: &CaseRecord) -> RenderableCase {
    RenderableCase {
        name: case.name.clone(),
        status: match case.status {
            CaseStatus::Pass => RenderableStatus::Pass,
            CaseStatus::Fail => RenderableStatus::Fail,
            CaseStatus::Skip => RenderableStatus::Skip,
        },
        matched: case.matched,
        violations: case
            .violations
            .iter()
            .map(|v| RenderableViolation {
                message: v.message.clone(),
                path: v.path.clone(),
            })
            .collect(),
        failures: case
            .failures
            .iter()
            .map(|f| RenderableFailure {
                assertion: f.assertion,
                expected: f.expected.clone(),
                actual: f.actual.clone(),
            })
            .collect(),
        error: case.error.clone(),
    }
}
