//! Stable identifiers for error codes and assertion kinds.
//!
//! Codes are short snake_case discriminators. They appear in JSON reports,
//! CLI diagnostics, and `gatecheck explain`.

// Structural errors (abort loading)
pub const CODE_CONFLICT: &str = "conflict";
pub const CODE_NOT_FOUND: &str = "not_found";
pub const CODE_SCHEMA_MISMATCH: &str = "schema_mismatch";
pub const CODE_COMPILE_ERROR: &str = "compile_error";
pub const CODE_PATH_RESOLUTION: &str = "path_resolution";

// Per-case outcomes (recorded in the report)
pub const CODE_ASSERTION_FAILURE: &str = "assertion_failure";
pub const CODE_BUDGET_EXCEEDED: &str = "budget_exceeded";

// Assertion kinds
pub const ASSERT_VIOLATIONS_NO: &str = "violations.no";
pub const ASSERT_VIOLATIONS_YES: &str = "violations.yes";
pub const ASSERT_VIOLATIONS_COUNT: &str = "violations.count";
pub const ASSERT_MESSAGE: &str = "violations.message";

// Tool-level
pub const CODE_RUNTIME_ERROR: &str = "runtime_error";
