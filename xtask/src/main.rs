//! Developer tasks (schema generation, conformance checks).
//!
//! Keeping this separate avoids bloating the end-user CLI.

use anyhow::{Context, bail};
use gatecheck_test_util::normalize_nondeterministic;
use schemars::schema_for;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the project root (parent of xtask directory).
fn project_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or(manifest_dir)
}

/// Get the schemas directory path.
fn schemas_dir() -> PathBuf {
    project_root().join("schemas")
}

fn fixtures_dir() -> PathBuf {
    project_root().join("tests").join("fixtures")
}

/// Schema definition with its target filename.
struct SchemaSpec {
    filename: &'static str,
    generate: fn() -> schemars::Schema,
}

/// Generate the VerificationReport schema.
fn generate_report_schema() -> schemars::Schema {
    schema_for!(gatecheck_types::VerificationReport)
}

/// Generate the GatecheckConfigV1 schema.
fn generate_config_schema() -> schemars::Schema {
    schema_for!(gatecheck_settings::GatecheckConfigV1)
}

/// List of schemas to generate.
fn schema_specs() -> Vec<SchemaSpec> {
    vec![
        SchemaSpec {
            filename: "gatecheck.report.v1.json",
            generate: generate_report_schema,
        },
        SchemaSpec {
            filename: "gatecheck.config.v1.json",
            generate: generate_config_schema,
        },
    ]
}

/// Serialize a schema to pretty-printed JSON with trailing newline.
fn serialize_schema(schema: &schemars::Schema) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(schema).context("Failed to serialize schema")?;
    json.push('\n');
    Ok(json)
}

/// Emit schemas to the schemas/ directory.
fn emit_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir();
    fs::create_dir_all(&dir).context("Failed to create schemas directory")?;

    for spec in schema_specs() {
        let json = serialize_schema(&(spec.generate)())?;
        let path = dir.join(spec.filename);
        fs::write(&path, &json)
            .with_context(|| format!("Failed to write schema to {}", path.display()))?;
        println!("Wrote {}", path.display());
    }

    println!("\nSchemas emitted successfully.");
    Ok(())
}

/// Validate that schemas in the repo match what would be generated.
fn validate_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir();
    let mut missing = Vec::new();
    let mut mismatched = Vec::new();

    for spec in schema_specs() {
        let path = dir.join(spec.filename);
        if !path.exists() {
            missing.push(spec.filename);
            continue;
        }

        let expected = serialize_schema(&(spec.generate)())?;
        let actual = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if expected != actual {
            mismatched.push(spec.filename);
        }
    }

    if missing.is_empty() && mismatched.is_empty() {
        println!("All schemas are up to date.");
        return Ok(());
    }
    if !missing.is_empty() {
        eprintln!("Missing schemas:");
        for name in &missing {
            eprintln!("  - {}", name);
        }
    }
    if !mismatched.is_empty() {
        eprintln!("Schemas out of date:");
        for name in &mismatched {
            eprintln!("  - {}", name);
        }
    }
    eprintln!("\nRun `cargo xtask emit-schemas` to regenerate.");
    bail!("Schema validation failed")
}

fn print_help() {
    eprintln!("xtask commands:");
    eprintln!("  help              Show this message");
    eprintln!("  emit-schemas      Generate JSON schemas from Rust types to schemas/");
    eprintln!("  validate-schemas  Check if schemas/ matches generated output (for CI)");
    eprintln!("  conform           Validate golden fixture reports against the report schema");
    eprintln!("  conform-full      conform + run the gatecheck binary against every fixture");
    eprintln!("  explain-coverage  Validate all codes and assertion kinds have explanations");
}

fn report_validator() -> anyhow::Result<jsonschema::Validator> {
    let schema = serde_json::to_value(generate_report_schema()).context("serialize schema")?;
    jsonschema::validator_for(&schema).map_err(|e| anyhow::anyhow!("Failed to compile schema: {}", e))
}

/// Fixture directories that carry a golden `expected.report.json`, sorted.
fn golden_fixtures() -> anyhow::Result<Vec<(String, PathBuf)>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(fixtures_dir()).context("Failed to read tests/fixtures/")? {
        let dir = entry?.path();
        if !dir.join("expected.report.json").exists() {
            continue;
        }
        let name = dir
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        out.push((name, dir));
    }
    out.sort();
    Ok(out)
}

fn read_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Validate golden fixture reports against the generated report schema.
fn conform() -> anyhow::Result<()> {
    let validator = report_validator()?;
    let mut errors = Vec::new();

    for (name, dir) in golden_fixtures()? {
        let report = read_json(&dir.join("expected.report.json"))?;
        let before = errors.len();
        for err in validator.iter_errors(&report) {
            errors.push(format!("fixture '{}': schema validation: {}", name, err));
        }
        if errors.len() == before {
            println!("  ✓ fixture '{}' matches the report schema", name);
        }
    }

    if !errors.is_empty() {
        for err in &errors {
            eprintln!("  - {}", err);
        }
        bail!("Conformance validation failed with {} errors", errors.len());
    }

    println!("\n✓ Conformance checks passed!");
    Ok(())
}

/// Run the built gatecheck binary on every golden fixture and compare reports.
fn conform_full() -> anyhow::Result<()> {
    conform()?;

    println!("\n--- Full conformance: gatecheck binary output ---\n");

    let bin = project_root().join("target").join("debug").join("gatecheck");
    #[cfg(target_os = "windows")]
    let bin = bin.with_extension("exe");
    if !bin.exists() {
        bail!(
            "gatecheck binary not found at {}.\n\
            Run `cargo build -p gatecheck-cli` first.",
            bin.display()
        );
    }

    let validator = report_validator()?;
    let mut errors = Vec::new();

    for (name, dir) in golden_fixtures()? {
        let temp_dir = tempfile::tempdir().context("Failed to create temp dir")?;
        let report_out = temp_dir.path().join("report.json");

        let output = std::process::Command::new(&bin)
            .current_dir(&dir)
            .arg("verify")
            .arg("suite.yaml")
            .arg("--report-out")
            .arg(&report_out)
            .output()
            .with_context(|| format!("Failed to run gatecheck on fixture '{}'", name))?;

        // 0 and 2 both write a report; 1 is a structural error.
        if output.status.code() == Some(1) || !report_out.exists() {
            errors.push(format!(
                "fixture '{}': gatecheck exited with {:?}: {}",
                name,
                output.status.code(),
                String::from_utf8_lossy(&output.stderr)
            ));
            continue;
        }

        let actual = read_json(&report_out)?;
        for err in validator.iter_errors(&actual) {
            errors.push(format!("fixture '{}': schema validation: {}", name, err));
        }

        let golden = read_json(&dir.join("expected.report.json"))?;
        if normalize_nondeterministic(actual) != normalize_nondeterministic(golden) {
            errors.push(format!(
                "fixture '{}': output differs from expected.report.json",
                name
            ));
        } else {
            println!("  ✓ fixture '{}' matches its golden report", name);
        }
    }

    if !errors.is_empty() {
        eprintln!("\nFull conformance errors:");
        for err in &errors {
            eprintln!("  - {}", err);
        }
        bail!(
            "Full conformance validation failed with {} errors",
            errors.len()
        );
    }

    println!("\n✓ Full conformance checks passed!");
    Ok(())
}

/// Validate that all codes and assertion kinds have explanations.
fn explain_coverage() -> anyhow::Result<()> {
    let codes = gatecheck_types::explain::all_codes();
    let kinds = gatecheck_types::explain::all_assertion_kinds();

    let mut errors = Vec::new();
    for id in codes.iter().chain(kinds.iter()) {
        match gatecheck_types::explain::lookup_explanation(id) {
            Some(exp) => {
                if exp.title.is_empty() {
                    errors.push(format!("'{}' has empty title", id));
                }
                if exp.description.is_empty() {
                    errors.push(format!("'{}' has empty description", id));
                }
                if exp.remediation.is_empty() {
                    errors.push(format!("'{}' has empty remediation", id));
                }
            }
            None => errors.push(format!("'{}' has no explanation", id)),
        }
    }

    if errors.is_empty() {
        println!("✓ {} codes have explanations", codes.len());
        println!("✓ {} assertion kinds have explanations", kinds.len());
        println!("\n✓ All explain coverage checks passed!");
        Ok(())
    } else {
        for error in &errors {
            eprintln!("  - {}", error);
        }
        bail!(
            "Explain coverage validation failed with {} errors",
            errors.len()
        )
    }
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cmd = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match cmd {
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        "emit-schemas" => emit_schemas(),
        "validate-schemas" => validate_schemas(),
        "conform" => conform(),
        "conform-full" => conform_full(),
        "explain-coverage" => explain_coverage(),
        other => bail!("unknown xtask command: {other}\n\nRun `cargo xtask help` for usage."),
    }
    .context("xtask failed")
}
