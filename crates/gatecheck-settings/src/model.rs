use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const SCHEMA_CONFIG_V1: &str = "gatecheck.config.v1";

/// `gatecheck.toml` schema v1.
///
/// Every field is optional; unset fields fall back to CLI flags and then defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GatecheckConfigV1 {
    /// Optional schema string for tooling (`gatecheck.config.v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Run tests of a suite on a thread pool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel: Option<bool>,

    /// Evaluation step budget per case.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_eval_steps: Option<u64>,

    /// How many violations to list per failed case in rendered output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_violations_shown: Option<u32>,

    /// Globs selecting suite files when a directory is given.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suite_patterns: Vec<String>,

    /// Globs for paths never treated as suites.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}
