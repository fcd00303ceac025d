//! Fuzz target for template documents: YAML parsing, parameter schema
//! parsing and policy compilation in one pass.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_template_document
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = gatecheck_repo::fuzz::compile_template_document(text);
    }
});
