//! The `explain` use case: look up error code and assertion kind documentation.

use gatecheck_types::explain::{self, Explanation};
use std::fmt::Write;

/// What an explained identifier names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Topic {
    /// A structural or evaluation error code, as printed in `gatecheck error [code]`.
    ErrorCode,
    /// A suite assertion such as `violations.count`.
    AssertionKind,
}

impl Topic {
    fn label(self) -> &'static str {
        match self {
            Topic::ErrorCode => "error code",
            Topic::AssertionKind => "assertion kind",
        }
    }
}

/// Output from the explain use case.
#[derive(Clone, Debug)]
pub enum ExplainOutput {
    Found {
        identifier: String,
        topic: Topic,
        explanation: Explanation,
    },
    /// Unknown identifier; includes the available codes and assertion kinds.
    NotFound {
        identifier: String,
        available_codes: &'static [&'static str],
        available_assertions: &'static [&'static str],
    },
}

/// Look up an explanation for an error code or assertion kind.
pub fn run_explain(identifier: &str) -> ExplainOutput {
    let topic = if explain::all_assertion_kinds().contains(&identifier) {
        Topic::AssertionKind
    } else {
        Topic::ErrorCode
    };
    match explain::lookup_explanation(identifier) {
        Some(explanation) => ExplainOutput::Found {
            identifier: identifier.to_string(),
            topic,
            explanation,
        },
        None => ExplainOutput::NotFound {
            identifier: identifier.to_string(),
            available_codes: explain::all_codes(),
            available_assertions: explain::all_assertion_kinds(),
        },
    }
}

/// Terminal text for an explanation. The examples are suite or policy YAML,
/// printed as indented blocks so they can be pasted back into a document.
pub fn format_explanation(identifier: &str, topic: Topic, exp: &Explanation) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{identifier} ({})", topic.label());
    let _ = writeln!(out, "{}\n", exp.title);
    let _ = writeln!(out, "{}\n", exp.description);
    let _ = writeln!(out, "Remediation:");
    indent_into(&mut out, exp.remediation, 2);
    let _ = writeln!(out, "\nFailing document:");
    indent_into(&mut out, exp.examples.before, 4);
    let _ = writeln!(out, "\nPassing document:");
    indent_into(&mut out, exp.examples.after, 4);
    out
}

fn indent_into(out: &mut String, text: &str, width: usize) {
    for line in text.lines() {
        if line.is_empty() {
            out.push('\n');
        } else {
            let _ = writeln!(out, "{:width$}{line}", "");
        }
    }
}

/// Format the "not found" error message for terminal display.
pub fn format_not_found(
    identifier: &str,
    codes: &[&'static str],
    assertions: &[&'static str],
) -> String {
    format!(
        "Unknown code or assertion kind: {identifier}\n\nAvailable codes: {}\nAvailable assertion kinds: {}\n",
        codes.join(", "),
        assertions.join(", ")
    )
}
