use crate::{
    RenderableCase, RenderableFailure, RenderableReport, RenderableStatus, RenderableSuite,
    RenderableSummary, RenderableTest, RenderableViolation,
};

pub(crate) fn passing_case(name: &str) -> RenderableCase {
    RenderableCase {
        name: name.to_string(),
        status: RenderableStatus::Pass,
        matched: true,
        violations: Vec::new(),
        failures: Vec::new(),
        error: None,
    }
}

pub(crate) fn failing_case(name: &str) -> RenderableCase {
    RenderableCase {
        name: name.to_string(),
        status: RenderableStatus::Fail,
        matched: true,
        violations: vec![
            RenderableViolation {
                message: "missing required label: owner".to_string(),
                path: Some("metadata.labels.owner".to_string()),
            },
            RenderableViolation {
                message: "missing required label: team".to_string(),
                path: Some("metadata.labels.team".to_string()),
            },
        ],
        failures: vec![RenderableFailure {
            assertion: 0,
            expected: "no violations".to_string(),
            actual: "2 violations".to_string(),
        }],
        error: None,
    }
}

pub(crate) fn report(cases: Vec<RenderableCase>) -> RenderableReport {
    let mut summary = RenderableSummary {
        suites: 1,
        tests: 1,
        ..RenderableSummary::default()
    };
    for c in &cases {
        summary.cases += 1;
        match c.status {
            RenderableStatus::Pass => summary.passed += 1,
            RenderableStatus::Fail => summary.failed += 1,
            RenderableStatus::Skip => summary.skipped += 1,
        }
    }
    let verdict = if summary.failed > 0 {
        RenderableStatus::Fail
    } else {
        RenderableStatus::Pass
    };
    RenderableReport {
        verdict,
        summary,
        suites: vec![RenderableSuite {
            name: "labels".to_string(),
            path: Some("policies/labels/suite.yaml".to_string()),
            tests: vec![RenderableTest {
                name: "owner-and-team".to_string(),
                template: "K8sRequiredLabels".to_string(),
                constraint: "must-have-owner".to_string(),
                cases,
            }],
        }],
    }
}
