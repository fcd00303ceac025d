//! Pure constraint evaluation (no IO).
//!
//! Input: templates, constraints and suites constructed elsewhere.
//! Output: per-case outcomes with violations and assertion failures.

#![forbid(unsafe_code)]

pub mod error;
pub mod fingerprint;
pub mod matcher;
pub mod model;
pub mod policy;
pub mod registry;
pub mod runner;
pub mod schema;
pub mod store;

mod evaluator;

pub use error::{CompileError, EngineError, Entity, EvalError};
pub use evaluator::evaluate;
pub use registry::{Template, TemplateRegistry, TemplateSource};
pub use runner::{RunOptions, SuiteOutcome, run_suite};
pub use store::{Constraint, ConstraintSource, ConstraintStore};

#[cfg(test)]
mod proptest;
#[cfg(test)]
mod test_support;
