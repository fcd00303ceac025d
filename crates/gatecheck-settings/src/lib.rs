//! Config parsing and resolution.
//!
//! This crate is intentionally IO-free: it parses and resolves configuration provided as strings.

#![forbid(unsafe_code)]

mod model;
mod resolve;

pub use model::{GatecheckConfigV1, SCHEMA_CONFIG_V1};
pub use resolve::{
    DEFAULT_MAX_VIOLATIONS_SHOWN, DEFAULT_SUITE_PATTERNS, Overrides, ResolvedConfig,
};

/// Parse `gatecheck.toml` (or equivalent) into a typed model.
pub fn parse_config_toml(input: &str) -> anyhow::Result<GatecheckConfigV1> {
    let cfg: GatecheckConfigV1 = toml::from_str(input)?;
    Ok(cfg)
}

/// Resolve the effective config: file values, then CLI overrides, then defaults.
pub fn resolve_config(
    cfg: GatecheckConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    resolve::resolve_config(cfg, overrides)
}
