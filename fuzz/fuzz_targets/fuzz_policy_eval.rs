//! Fuzz target for policy evaluation.
//!
//! Goal: Evaluating a compiled policy against arbitrary input and parameters
//! should **never panic** and always stop within the step budget.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_policy_eval
//! ```

#![no_main]

use arbitrary::Arbitrary;
use gatecheck_domain::policy::{EvalOptions, compile};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct EvalInput {
    /// Policy source text.
    source: String,
    /// JSON text for `input`.
    input: String,
    /// JSON text for `parameters`.
    parameters: String,
}

fuzz_target!(|case: EvalInput| {
    if case.source.len() > 4096 || case.input.len() > 4096 || case.parameters.len() > 1024 {
        return;
    }

    let Ok(policy) = compile(&case.source) else {
        return;
    };
    let input = serde_json::from_str(&case.input).unwrap_or(serde_json::Value::Null);
    let parameters = serde_json::from_str(&case.parameters).unwrap_or(serde_json::Value::Null);

    // Small budget keeps runaway programs fast.
    let options = EvalOptions { max_steps: 10_000 };
    let _ = policy.evaluate(&input, &parameters, &options);
});
