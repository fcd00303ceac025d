use gatecheck_types::ids;
use std::fmt;
use thiserror::Error;

/// What kind of registered entity an error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entity {
    Template,
    Constraint,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Template => f.write_str("template"),
            Entity::Constraint => f.write_str("constraint"),
        }
    }
}

/// Structural errors. These are configuration defects: they abort loading of
/// the offending suite instead of becoming test outcomes.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("{entity} '{name}' is already registered")]
    Conflict { entity: Entity, name: String },

    #[error("{entity} '{name}' not found")]
    NotFound { entity: Entity, name: String },

    #[error("test '{test}': constraint '{constraint}' uses template '{actual}', expected '{expected}'")]
    TemplateMismatch {
        test: String,
        constraint: String,
        expected: String,
        actual: String,
    },

    #[error("constraint '{constraint}': parameter '{field}' {reason}")]
    SchemaMismatch {
        constraint: String,
        field: String,
        reason: String,
    },

    #[error("template '{kind}' failed to compile: {source}")]
    Compile {
        kind: String,
        #[source]
        source: CompileError,
    },

    #[error("cannot resolve '{reference}' relative to {base}: {reason}")]
    PathResolution {
        reference: String,
        base: String,
        reason: String,
    },
}

impl EngineError {
    /// Stable code used in reports and `gatecheck explain`.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Conflict { .. } => ids::CODE_CONFLICT,
            EngineError::NotFound { .. } | EngineError::TemplateMismatch { .. } => {
                ids::CODE_NOT_FOUND
            }
            EngineError::SchemaMismatch { .. } => ids::CODE_SCHEMA_MISMATCH,
            EngineError::Compile { .. } => ids::CODE_COMPILE_ERROR,
            EngineError::PathResolution { .. } => ids::CODE_PATH_RESOLUTION,
        }
    }
}

/// A template that cannot be turned into an executable policy.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("line {line}, column {col}: {message}")]
    Policy { line: u32, col: u32, message: String },

    #[error("parameter schema field '{field}': {message}")]
    Schema { field: String, message: String },
}

/// Evaluation-time failure. Missing fields are not errors (they make a rule
/// silently not fire); only resource exhaustion surfaces here.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("evaluation exceeded the budget of {limit} steps")]
    BudgetExceeded { limit: u64 },
}

impl EvalError {
    pub fn code(&self) -> &'static str {
        match self {
            EvalError::BudgetExceeded { .. } => ids::CODE_BUDGET_EXCEEDED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_entity() {
        let err = EngineError::Conflict {
            entity: Entity::Template,
            name: "K8sRequiredLabels".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "template 'K8sRequiredLabels' is already registered"
        );
        assert_eq!(err.code(), "conflict");
    }

    #[test]
    fn compile_error_carries_position() {
        let err = EngineError::Compile {
            kind: "K".to_string(),
            source: CompileError::Policy {
                line: 3,
                col: 7,
                message: "unexpected '}'".to_string(),
            },
        };
        assert_eq!(
            err.to_string(),
            "template 'K' failed to compile: line 3, column 7: unexpected '}'"
        );
        assert_eq!(err.code(), "compile_error");
    }
}
