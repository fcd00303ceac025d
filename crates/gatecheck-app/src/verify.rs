//! The `verify` use case: discover suites, run them and produce a report.

use anyhow::Context;
use camino::Utf8PathBuf;
use gatecheck_domain::policy::EvalOptions;
use gatecheck_domain::{EngineError, RunOptions, run_suite};
use gatecheck_settings::{GatecheckConfigV1, Overrides, ResolvedConfig};
use gatecheck_types::{
    RunMeta, SCHEMA_REPORT_V1, Summary, ToolMeta, Verdict, VerificationReport, ids,
};
use regex::Regex;
use time::OffsetDateTime;

use crate::report::suite_record;

const LOG_TARGET: &str = "gatecheck::verify";

/// Input for the verify use case.
#[derive(Clone, Debug)]
pub struct VerifyInput<'a> {
    /// Suite files or directories to search for suites.
    pub paths: &'a [Utf8PathBuf],
    /// Config file contents (empty string if not found).
    pub config_text: &'a str,
    /// CLI overrides.
    pub overrides: Overrides,
    /// Regex over `test/case` names; cases that do not match are skipped.
    pub filter: Option<&'a str>,
}

/// Output from the verify use case.
#[derive(Clone, Debug)]
pub struct VerifyOutput {
    pub report: VerificationReport,
    /// The resolved configuration used.
    pub resolved_config: ResolvedConfig,
}

/// Run the verify use case: parse config, discover and load suites, run every case.
///
/// Structural errors (conflicts, missing references, schema mismatches, compile errors)
/// abort the whole run. Failing cases do not; they are recorded in the report.
pub fn run_verify(input: VerifyInput<'_>) -> anyhow::Result<VerifyOutput> {
    let started_at = OffsetDateTime::now_utc();

    // Parse config (empty is allowed, defaults apply).
    let cfg = if input.config_text.trim().is_empty() {
        GatecheckConfigV1::default()
    } else {
        gatecheck_settings::parse_config_toml(input.config_text).context("parse config")?
    };
    let resolved =
        gatecheck_settings::resolve_config(cfg, input.overrides.clone()).context("resolve config")?;

    let filter = input
        .filter
        .map(Regex::new)
        .transpose()
        .context("invalid --run pattern")?;
    let options = RunOptions {
        parallel: resolved.parallel,
        eval: EvalOptions {
            max_steps: resolved.max_eval_steps,
        },
        filter,
    };

    let mut suite_paths: Vec<Utf8PathBuf> = Vec::new();
    for path in input.paths {
        let found =
            gatecheck_repo::discover_suites(path, &resolved.suite_globs, &resolved.exclude_globs)
                .with_context(|| format!("discover suites under {path}"))?;
        if found.is_empty() {
            log::warn!(target: LOG_TARGET, "no suites found under {path}");
        }
        for p in found {
            if !suite_paths.contains(&p) {
                suite_paths.push(p);
            }
        }
    }

    let mut suites = Vec::with_capacity(suite_paths.len());
    for path in &suite_paths {
        let loaded = gatecheck_repo::load_suite(path)?;
        let outcome = run_suite(&loaded.suite, &loaded.registry, &loaded.store, &options)
            .with_context(|| format!("run suite {path}"))?;
        log::info!(
            target: LOG_TARGET,
            "suite {}: {} case(s), {} failed",
            outcome.name,
            outcome.cases().count(),
            outcome.count(gatecheck_types::CaseStatus::Fail)
        );
        suites.push(suite_record(outcome));
    }

    let summary = Summary::from_suites(&suites);
    let ended_at = OffsetDateTime::now_utc();
    let duration_ms = (ended_at - started_at).whole_milliseconds().max(0) as u64;

    let report = VerificationReport {
        schema: SCHEMA_REPORT_V1.to_string(),
        tool: ToolMeta {
            name: "gatecheck".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        run: RunMeta {
            started_at,
            ended_at,
            duration_ms,
        },
        verdict: summary.verdict(),
        summary,
        suites,
    };

    Ok(VerifyOutput {
        report,
        resolved_config: resolved,
    })
}

/// Map verdict to exit code: 0 = pass, 2 = fail.
pub fn verdict_exit_code(verdict: Verdict) -> i32 {
    match verdict {
        Verdict::Pass => 0,
        Verdict::Fail => 2,
    }
}

/// Stable code of the structural error behind `err`, or `runtime_error`.
pub fn error_code(err: &anyhow::Error) -> &'static str {
    err.chain()
        .find_map(|e| e.downcast_ref::<EngineError>())
        .map(EngineError::code)
        .unwrap_or(ids::CODE_RUNTIME_ERROR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8Path;
    use gatecheck_types::CaseStatus;

    const TEMPLATE: &str = r#"kind: K8sRequiredLabels
parameterSchema:
  labels: string-array
policyBody: |
  violation {
    some label in parameters.labels
    not input.review.object.metadata.labels[label]
    msg := sprintf("missing required label: %v", [label])
  }
"#;

    const CONSTRAINT: &str = r#"name: must-have-owner
templateKind: K8sRequiredLabels
match:
  kinds:
    - apiGroup: ""
      kind: Pod
parameters:
  labels: [owner]
"#;

    const SUITE: &str = r#"name: labels
tests:
  - name: owner
    templateRef: template.yaml
    constraintRef: constraint.yaml
    cases:
      - name: labelled
        object:
          apiVersion: v1
          kind: Pod
          metadata:
            name: web
            labels:
              owner: me
        assertions:
          - violations: no
      - name: unlabelled
        object:
          apiVersion: v1
          kind: Pod
          metadata:
            name: bare
        assertions:
          - violations: no
"#;

    fn write_file(path: &Utf8Path, contents: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, contents).expect("write file");
    }

    fn write_suite(root: &Utf8Path) {
        write_file(&root.join("labels/template.yaml"), TEMPLATE);
        write_file(&root.join("labels/constraint.yaml"), CONSTRAINT);
        write_file(&root.join("labels/suite.yaml"), SUITE);
    }

    fn verify(root: &Utf8Path, config_text: &str, filter: Option<&str>) -> anyhow::Result<VerifyOutput> {
        let paths = vec![root.to_path_buf()];
        run_verify(VerifyInput {
            paths: &paths,
            config_text,
            overrides: Overrides::default(),
            filter,
        })
    }

    #[test]
    fn failing_case_fails_the_verdict() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let root = Utf8Path::from_path(tmp.path()).expect("utf8 path");
        write_suite(root);

        let output = verify(root, "", None).expect("run_verify");
        let report = output.report;
        assert_eq!(report.schema, SCHEMA_REPORT_V1);
        assert_eq!(report.verdict, Verdict::Fail);
        assert_eq!(report.summary.cases, 2);
        assert_eq!(report.summary.passed, 1);
        assert_eq!(report.summary.failed, 1);

        let unlabelled = &report.suites[0].tests[0].cases[1];
        assert_eq!(unlabelled.status, CaseStatus::Fail);
        assert_eq!(unlabelled.violations.len(), 1);
        let fp = unlabelled.violations[0].fingerprint.as_deref().expect("fingerprint");
        assert_eq!(fp.len(), 64);
    }

    #[test]
    fn filter_skips_cases() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let root = Utf8Path::from_path(tmp.path()).expect("utf8 path");
        write_suite(root);

        let output = verify(root, "", Some("/labelled$")).expect("run_verify");
        assert_eq!(output.report.verdict, Verdict::Pass);
        assert_eq!(output.report.summary.skipped, 1);
    }

    #[test]
    fn config_excludes_suites() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let root = Utf8Path::from_path(tmp.path()).expect("utf8 path");
        write_suite(root);

        let output = verify(root, "exclude = [\"labels/**\"]\n", None).expect("run_verify");
        assert!(output.report.suites.is_empty());
        assert_eq!(output.report.verdict, Verdict::Pass);
    }

    #[test]
    fn invalid_filter_is_an_error() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let root = Utf8Path::from_path(tmp.path()).expect("utf8 path");
        write_suite(root);

        let err = verify(root, "", Some("(")).unwrap_err();
        assert!(err.to_string().contains("invalid --run pattern"));
        assert_eq!(error_code(&err), ids::CODE_RUNTIME_ERROR);
    }

    #[test]
    fn structural_error_carries_its_code() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let root = Utf8Path::from_path(tmp.path()).expect("utf8 path");
        write_file(
            &root.join("suite.yaml"),
            "tests:\n  - name: t\n    templateRef: missing.yaml\n    constraintRef: c.yaml\n",
        );

        let err = verify(root, "", None).unwrap_err();
        assert_eq!(error_code(&err), ids::CODE_PATH_RESOLUTION);
    }

    #[test]
    fn verdict_exit_codes() {
        assert_eq!(verdict_exit_code(Verdict::Pass), 0);
        assert_eq!(verdict_exit_code(Verdict::Fail), 2);
    }
}
