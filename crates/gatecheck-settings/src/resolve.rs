use crate::model::{GatecheckConfigV1, SCHEMA_CONFIG_V1};
use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};

const LOG_TARGET: &str = "gatecheck::settings";

pub const DEFAULT_SUITE_PATTERNS: &[&str] = &["**/suite.yaml", "**/suite.yml", "**/*.suite.yaml"];
pub const DEFAULT_MAX_VIOLATIONS_SHOWN: u32 = 20;
const DEFAULT_MAX_EVAL_STEPS: u64 = 1_000_000;

/// Values from the command line. `Some` wins over the config file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub parallel: Option<bool>,
    pub max_eval_steps: Option<u64>,
    pub max_violations_shown: Option<u32>,
}

#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub parallel: bool,
    pub max_eval_steps: u64,
    pub max_violations_shown: u32,
    pub suite_patterns: Vec<String>,
    pub exclude: Vec<String>,
    /// Compiled `suite_patterns`.
    pub suite_globs: GlobSet,
    /// Compiled `exclude`.
    pub exclude_globs: GlobSet,
}

pub fn resolve_config(
    cfg: GatecheckConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    if let Some(schema) = cfg.schema.as_deref()
        && schema != SCHEMA_CONFIG_V1
    {
        anyhow::bail!("unsupported config schema: {schema} (expected {SCHEMA_CONFIG_V1})");
    }

    let parallel = overrides.parallel.or(cfg.parallel).unwrap_or(true);

    let max_eval_steps = overrides
        .max_eval_steps
        .or(cfg.max_eval_steps)
        .unwrap_or(DEFAULT_MAX_EVAL_STEPS);
    if max_eval_steps == 0 {
        anyhow::bail!("max_eval_steps must be greater than zero");
    }

    let max_violations_shown = overrides
        .max_violations_shown
        .or(cfg.max_violations_shown)
        .unwrap_or(DEFAULT_MAX_VIOLATIONS_SHOWN);

    let suite_patterns = if cfg.suite_patterns.is_empty() {
        DEFAULT_SUITE_PATTERNS.iter().map(|p| p.to_string()).collect()
    } else {
        cfg.suite_patterns
    };
    let suite_globs = build_globset("suite_patterns", &suite_patterns)?;
    let exclude_globs = build_globset("exclude", &cfg.exclude)?;

    log::debug!(
        target: LOG_TARGET,
        "resolved config: parallel={parallel} max_eval_steps={max_eval_steps} patterns={suite_patterns:?}"
    );

    Ok(ResolvedConfig {
        parallel,
        max_eval_steps,
        max_violations_shown,
        suite_patterns,
        exclude: cfg.exclude,
        suite_globs,
        exclude_globs,
    })
}

fn build_globset(field: &str, patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob =
            Glob::new(pattern).with_context(|| format!("invalid {field} glob: {pattern}"))?;
        builder.add(glob);
    }
    builder
        .build()
        .with_context(|| format!("failed to build {field} globs"))
}
