//! Use case orchestration for gatecheck.
//!
//! This crate provides the application layer: use cases that coordinate the settings, repo,
//! domain and render layers. The CLI crate depends on this; it only handles argument parsing
//! and I/O.

#![forbid(unsafe_code)]

mod explain;
mod render;
mod report;
mod verify;

pub use explain::{ExplainOutput, Topic, format_explanation, format_not_found, run_explain};
pub use render::{render_annotations, render_markdown, render_text};
pub use report::{parse_report_json, serialize_report, suite_record, to_renderable};
pub use verify::{VerifyInput, VerifyOutput, error_code, run_verify, verdict_exit_code};
