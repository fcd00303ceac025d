//! Repository adapters: discover suite files, read and parse the documents they reference.
//!
//! This crate is allowed to do filesystem IO. Everything it loads is handed to the
//! domain crate as plain values; no evaluation happens here.

#![forbid(unsafe_code)]

mod discover;
mod load;
mod parse;

pub use discover::discover_suites;
pub use load::{LoadedSuite, load_suite};

/// Fuzz-friendly API for testing parsing robustness without filesystem access.
/// These functions are designed to never panic on any input.
pub mod fuzz {
    use super::*;
    use gatecheck_domain::Template;

    /// Parse arbitrary text as a suite document.
    ///
    /// Returns `Ok(())` when the text is a well-formed suite. **Never panics** on any input.
    pub fn parse_suite_document(text: &str) -> anyhow::Result<()> {
        let doc = parse::parse_suite(text)?;
        for test in doc.tests {
            for case in test.cases {
                for assertion in case.assertions {
                    assertion.into_assertion()?;
                }
            }
        }
        Ok(())
    }

    /// Parse arbitrary text as a template document and compile it.
    ///
    /// **Never panics** on any input.
    pub fn compile_template_document(text: &str) -> anyhow::Result<()> {
        let src = parse::parse_template(text)?.into_source();
        Template::compile(src)?;
        Ok(())
    }

    /// Parse arbitrary text as a constraint document, including the checks on
    /// its name, template kind and match kinds.
    ///
    /// **Never panics** on any input.
    pub fn parse_constraint_document(text: &str) -> anyhow::Result<()> {
        parse::parse_constraint(text)?;
        Ok(())
    }
}
