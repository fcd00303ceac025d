//! Render use cases: text, Markdown and GitHub annotations from in-memory reports.

use gatecheck_render::{RenderableReport, TextOptions};

pub fn render_text(report: &RenderableReport, verbose: bool, max_violations_shown: u32) -> String {
    gatecheck_render::render_text(
        report,
        &TextOptions {
            verbose,
            max_violations_shown: max_violations_shown as usize,
        },
    )
}

pub fn render_markdown(report: &RenderableReport) -> String {
    gatecheck_render::render_markdown(report)
}

pub fn render_annotations(report: &RenderableReport, max: usize) -> Vec<String> {
    gatecheck_render::render_github_annotations(report)
        .into_iter()
        .take(max)
        .collect()
}
