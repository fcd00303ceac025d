use crate::RenderableReport;

pub fn render_markdown(report: &RenderableReport) -> String {
    let mut out = String::new();

    out.push_str("# Gatecheck report\n\n");
    let s = &report.summary;
    out.push_str(&format!(
        "- Verdict: **{}**\n- Suites: {} / Tests: {} / Cases: {}\n- Passed: {} / Failed: {} / Skipped: {}\n\n",
        report.verdict.label(),
        s.suites,
        s.tests,
        s.cases,
        s.passed,
        s.failed,
        s.skipped
    ));

    let mut failing = report.failing_cases().peekable();
    if failing.peek().is_none() {
        out.push_str("No failing cases.\n");
        return out;
    }

    out.push_str("## Failures\n");

    for (suite, test, case) in failing {
        out.push_str(&format!(
            "\n### `{} / {} / {}`\n\n",
            suite.name, test.name, case.name
        ));
        out.push_str(&format!(
            "- template `{}`, constraint `{}`\n",
            test.template, test.constraint
        ));
        if let Some(err) = &case.error {
            out.push_str(&format!("- error: {}\n", err));
        }
        for f in &case.failures {
            out.push_str(&format!(
                "- assertion {}: expected {}, got {}\n",
                f.assertion, f.expected, f.actual
            ));
        }
        for v in &case.violations {
            match &v.path {
                Some(path) => out.push_str(&format!("  - {} (`{}`)\n", v.message, path)),
                None => out.push_str(&format!("  - {}\n", v.message)),
            }
        }
    }

    out
}
