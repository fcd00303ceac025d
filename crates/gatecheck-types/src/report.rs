use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use time::OffsetDateTime;

/// Stable schema identifier for gatecheck verification reports.
pub const SCHEMA_REPORT_V1: &str = "gatecheck.report.v1";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Fail,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    Pass,
    Fail,
    Skip,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ToolMeta {
    pub name: String,
    pub version: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RunMeta {
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub ended_at: OffsetDateTime,
    pub duration_ms: u64,
}

/// A single violation produced by a policy evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ViolationRecord {
    pub message: String,

    /// Offending field path, when the rule bound one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Stable identifier for dedup and trending: a hash of
    /// `template + constraint + case + message + path`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,

    /// Rule-specific structured payload.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub details: JsonValue,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AssertionFailureRecord {
    /// Zero-based position of the assertion within the case.
    pub assertion: usize,
    pub expected: String,
    pub actual: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CaseRecord {
    pub name: String,
    pub status: CaseStatus,

    /// Whether the constraint's match rules selected the object at all.
    pub matched: bool,

    #[serde(default)]
    pub violations: Vec<ViolationRecord>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<AssertionFailureRecord>,

    /// Evaluation error (for example an exhausted step budget).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TestRecord {
    pub name: String,
    pub template: String,
    pub constraint: String,
    pub cases: Vec<CaseRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SuiteRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub tests: Vec<TestRecord>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Summary {
    pub suites: u32,
    pub tests: u32,
    pub cases: u32,
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
}

/// Top-level verification report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VerificationReport {
    /// Versioned schema identifier for the report shape.
    pub schema: String,
    pub tool: ToolMeta,
    pub run: RunMeta,
    pub verdict: Verdict,
    pub summary: Summary,
    pub suites: Vec<SuiteRecord>,
}

impl Summary {
    pub fn from_suites(suites: &[SuiteRecord]) -> Self {
        let mut summary = Summary {
            suites: suites.len() as u32,
            ..Summary::default()
        };
        for test in suites.iter().flat_map(|s| &s.tests) {
            summary.tests += 1;
            for case in &test.cases {
                summary.cases += 1;
                match case.status {
                    CaseStatus::Pass => summary.passed += 1,
                    CaseStatus::Fail => summary.failed += 1,
                    CaseStatus::Skip => summary.skipped += 1,
                }
            }
        }
        summary
    }

    pub fn verdict(&self) -> Verdict {
        if self.failed > 0 {
            Verdict::Fail
        } else {
            Verdict::Pass
        }
    }
}
