//! Fuzz target for suite and constraint document parsing.
//!
//! Goal: The document parsers should **never panic** on any input.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_suite_parser
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Suite files are YAML, which must be UTF-8.
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = gatecheck_repo::fuzz::parse_suite_document(text);
        let _ = gatecheck_repo::fuzz::parse_constraint_document(text);
    }
});
