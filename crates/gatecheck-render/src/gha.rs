use crate::RenderableReport;

/// Render failing cases as GitHub Actions workflow command annotations.
///
/// Format:
/// `::error file={suite path}::[gatecheck] {suite} / {test} / {case}: {detail}`
///
/// One annotation per assertion failure or evaluation error.
pub fn render_github_annotations(report: &RenderableReport) -> Vec<String> {
    let mut out = Vec::new();

    for (suite, test, case) in report.failing_cases() {
        let meta = suite
            .path
            .as_deref()
            .map(|p| format!(" file={}", escape_property(p)))
            .unwrap_or_default();
        let prefix = format!("[gatecheck] {} / {} / {}", suite.name, test.name, case.name);

        let mut details: Vec<String> = Vec::new();
        if let Some(err) = &case.error {
            details.push(err.clone());
        }
        for f in &case.failures {
            details.push(format!(
                "assertion {}: expected {}, got {}",
                f.assertion, f.expected, f.actual
            ));
        }

        for detail in details {
            let message = escape_data(&format!("{prefix}: {detail}"));
            out.push(format!("::error{}::{}", meta, message));
        }
    }

    out
}

fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}
