//! Stable DTOs and IDs used across the gatecheck workspace.

#![forbid(unsafe_code)]

pub mod explain;
pub mod ids;
mod report;

pub use report::{
    AssertionFailureRecord, CaseRecord, CaseStatus, RunMeta, SCHEMA_REPORT_V1, SuiteRecord,
    Summary, TestRecord, ToolMeta, Verdict, VerificationReport, ViolationRecord,
};
