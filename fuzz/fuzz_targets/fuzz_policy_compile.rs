//! Fuzz target for policy compilation.
//!
//! Goal: The lexer, parser and scope checker should **never panic** on any input.
//! Compile errors are expected; panics are not.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_policy_compile
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = gatecheck_domain::policy::compile(text);
    }
});
