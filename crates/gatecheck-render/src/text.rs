use crate::{RenderableCase, RenderableReport, RenderableStatus, RenderableSummary};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextOptions {
    /// Show violations of passing cases and unmatched markers too.
    pub verbose: bool,
    /// Cap on violations listed per case.
    pub max_violations_shown: usize,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            max_violations_shown: 10,
        }
    }
}

/// Render the terminal report printed by `gatecheck verify`.
///
/// Every case gets a status line. Failing cases always show their assertion
/// failures, evaluation error and violations; passing cases only in verbose mode.
pub fn render_text(report: &RenderableReport, options: &TextOptions) -> String {
    let mut out = String::new();

    for suite in &report.suites {
        match &suite.path {
            Some(path) => out.push_str(&format!("suite {} ({})\n", suite.name, path)),
            None => out.push_str(&format!("suite {}\n", suite.name)),
        }
        for test in &suite.tests {
            out.push_str(&format!(
                "  test {} [{} / {}]\n",
                test.name, test.template, test.constraint
            ));
            for case in &test.cases {
                render_case(&mut out, case, options);
            }
        }
    }

    if !report.suites.is_empty() {
        out.push('\n');
    }
    out.push_str(&summary_line(&report.summary));
    out.push('\n');
    out.push_str(&format!("verdict: {}\n", report.verdict.label()));
    out
}

fn render_case(out: &mut String, case: &RenderableCase, options: &TextOptions) {
    let marker = if options.verbose && !case.matched && case.status != RenderableStatus::Skip {
        " (not matched)"
    } else {
        ""
    };
    out.push_str(&format!(
        "    {} {}{}\n",
        case.status.label(),
        case.name,
        marker
    ));

    let detailed = case.status == RenderableStatus::Fail || options.verbose;
    if !detailed {
        return;
    }

    if let Some(err) = &case.error {
        out.push_str(&format!("      error: {err}\n"));
    }
    for f in &case.failures {
        out.push_str(&format!(
            "      assertion {}: expected {}, got {}\n",
            f.assertion, f.expected, f.actual
        ));
    }
    for v in case.violations.iter().take(options.max_violations_shown) {
        match &v.path {
            Some(path) => out.push_str(&format!("      violation: {} ({})\n", v.message, path)),
            None => out.push_str(&format!("      violation: {}\n", v.message)),
        }
    }
    let hidden = case
        .violations
        .len()
        .saturating_sub(options.max_violations_shown);
    if hidden > 0 {
        out.push_str(&format!("      ... and {hidden} more\n"));
    }
}

fn summary_line(s: &RenderableSummary) -> String {
    format!(
        "{} {}, {} {}, {} {}: {} passed, {} failed, {} skipped",
        s.suites,
        plural(s.suites, "suite"),
        s.tests,
        plural(s.tests, "test"),
        s.cases,
        plural(s.cases, "case"),
        s.passed,
        s.failed,
        s.skipped
    )
}

fn plural(n: u32, word: &str) -> String {
    if n == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}
