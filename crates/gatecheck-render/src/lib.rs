//! Rendering utilities for terminals and CI surfaces (text, Markdown, GitHub annotations).

#![forbid(unsafe_code)]

mod gha;
mod markdown;
mod model;
mod text;

pub use gha::render_github_annotations;
pub use markdown::render_markdown;
pub use model::{
    RenderableCase, RenderableFailure, RenderableReport, RenderableStatus, RenderableSuite,
    RenderableSummary, RenderableTest, RenderableViolation,
};
pub use text::{TextOptions, render_text};

#[cfg(test)]
pub(crate) mod fixtures;
