//! The policy language: a small declarative rule language in the spirit of
//! Rego.
//!
//! Source is tokenized, parsed into an AST and statically checked once by
//! [`compile`]. The resulting [`Policy`] is immutable and can be evaluated
//! any number of times, from any thread.

mod ast;
mod builtins;
mod check;
mod eval;
mod lexer;
mod parser;

pub use eval::{DEFAULT_MAX_STEPS, EvalOptions};

use crate::error::{CompileError, EvalError};
use crate::model::Violation;
use serde_json::Value;

/// A compiled policy program.
#[derive(Clone, Debug, PartialEq)]
pub struct Policy {
    program: ast::Program,
}

/// Compile policy source. All syntax and scope errors are reported here.
pub fn compile(source: &str) -> Result<Policy, CompileError> {
    let mut program = parser::parse(source)?;
    check::check(&mut program)?;
    Ok(Policy { program })
}

impl Policy {
    /// Run every violation rule against `input` and collect the distinct
    /// violations, in rule order then iteration order.
    pub fn evaluate(
        &self,
        input: &Value,
        parameters: &Value,
        options: &EvalOptions,
    ) -> Result<Vec<Violation>, EvalError> {
        eval::run(&self.program, input, parameters, options)
    }

    pub fn rule_count(&self) -> usize {
        self.program.rules.len()
    }

    pub fn helper_names(&self) -> impl Iterator<Item = &str> {
        self.program.funcs.iter().map(|f| f.name.as_str())
    }
}

/// Names of every builtin function, for `gatecheck explain` style listings.
pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    builtins::names()
}
