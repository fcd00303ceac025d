//! CLI entry point for gatecheck.
//!
//! This module is intentionally thin: it handles argument parsing, I/O, logging setup and
//! exit codes. All business logic lives in the `gatecheck-app` crate.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand, ValueEnum};
use gatecheck_app::{
    ExplainOutput, VerifyInput, error_code, parse_report_json, render_annotations,
    render_markdown, render_text, run_explain, run_verify, serialize_report, to_renderable,
    verdict_exit_code,
};
use gatecheck_settings::Overrides;

const DEFAULT_CONFIG: &str = "gatecheck.toml";

#[derive(Parser, Debug)]
#[command(
    name = "gatecheck",
    version,
    about = "Test runner for admission-control policy templates and constraints"
)]
struct Cli {
    /// Path to gatecheck config TOML [default: gatecheck.toml if present].
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<Utf8PathBuf>,

    /// Set the logging level for diagnostic output (also honors RUST_LOG).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    cmd: Commands,
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    /// No logging output
    None,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run policy suites and report every case.
    Verify {
        /// Suite files or directories containing suites.
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<Utf8PathBuf>,

        /// Only run cases whose `test/case` name matches this regex.
        #[arg(long, value_name = "REGEX")]
        run: Option<String>,

        /// Run tests in parallel.
        #[arg(long, overrides_with = "no_parallel")]
        parallel: bool,

        /// Run tests one after another.
        #[arg(long)]
        no_parallel: bool,

        /// Override the evaluation step budget per case.
        #[arg(long, value_name = "N")]
        max_eval_steps: Option<u64>,

        /// Override the number of violations listed per case.
        #[arg(long, value_name = "N")]
        max_violations_shown: Option<u32>,

        /// Where to write the JSON report.
        #[arg(long, value_name = "FILE")]
        report_out: Option<Utf8PathBuf>,

        /// Where to write a Markdown summary.
        #[arg(long, value_name = "FILE")]
        markdown_out: Option<Utf8PathBuf>,

        /// Show violations of passing cases and unmatched cases.
        #[arg(long, short)]
        verbose: bool,
    },

    /// Render markdown from an existing JSON report.
    Md {
        /// Path to the JSON report file.
        #[arg(long)]
        report: Utf8PathBuf,

        /// Where to write the Markdown output (if not specified, prints to stdout).
        #[arg(long, short)]
        output: Option<Utf8PathBuf>,
    },

    /// Render GitHub Actions annotations from an existing JSON report.
    Annotations {
        /// Path to the JSON report file.
        #[arg(long)]
        report: Utf8PathBuf,

        /// Maximum number of annotations to emit.
        #[arg(long, default_value = "10")]
        max: usize,
    },

    /// Explain an error code or assertion kind.
    Explain {
        /// The code (e.g. "schema_mismatch") or assertion kind (e.g. "violations.count").
        identifier: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    match cli.cmd {
        Commands::Verify {
            ref paths,
            ref run,
            parallel,
            no_parallel,
            max_eval_steps,
            max_violations_shown,
            ref report_out,
            ref markdown_out,
            verbose,
        } => {
            let parallel = match (parallel, no_parallel) {
                (_, true) => Some(false),
                (true, false) => Some(true),
                (false, false) => None,
            };
            let overrides = Overrides {
                parallel,
                max_eval_steps,
                max_violations_shown,
            };
            cmd_verify(
                cli.config.as_deref(),
                paths,
                run.as_deref(),
                overrides,
                report_out.as_deref(),
                markdown_out.as_deref(),
                verbose,
            )
        }
        Commands::Md { report, output } => cmd_md(report, output),
        Commands::Annotations { report, max } => cmd_annotations(report, max),
        Commands::Explain { identifier } => cmd_explain(&identifier),
    }
}

fn init_logging(log_level: LogLevel) {
    let level = match log_level {
        LogLevel::None => return,
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(matches!(log_level, LogLevel::Debug | LogLevel::Trace))
        .init();
}

fn cmd_verify(
    config: Option<&Utf8Path>,
    paths: &[Utf8PathBuf],
    filter: Option<&str>,
    overrides: Overrides,
    report_out: Option<&Utf8Path>,
    markdown_out: Option<&Utf8Path>,
    verbose: bool,
) -> anyhow::Result<()> {
    let result = (|| -> anyhow::Result<i32> {
        let cfg_text = read_config(config)?;

        let output = run_verify(VerifyInput {
            paths,
            config_text: &cfg_text,
            overrides,
            filter,
        })?;

        let renderable = to_renderable(&output.report);
        print!(
            "{}",
            render_text(
                &renderable,
                verbose,
                output.resolved_config.max_violations_shown
            )
        );

        if let Some(path) = report_out {
            let data = serialize_report(&output.report)?;
            write_file(path, &data).context("write report json")?;
        }
        if let Some(path) = markdown_out {
            let md = render_markdown(&renderable);
            write_file(path, md.as_bytes()).context("write markdown")?;
        }

        Ok(verdict_exit_code(output.report.verdict))
    })();

    match result {
        Ok(code) => {
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Err(err) => {
            eprintln!("gatecheck error [{}]: {err:#}", error_code(&err));
            std::process::exit(1);
        }
    }
}

/// Read the config file. An explicit path must exist; the default may be absent.
fn read_config(config: Option<&Utf8Path>) -> anyhow::Result<String> {
    match config {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("read config: {path}"))
        }
        None => {
            let path = Utf8Path::new(DEFAULT_CONFIG);
            if path.exists() {
                std::fs::read_to_string(path).with_context(|| format!("read config: {path}"))
            } else {
                log::debug!("no {DEFAULT_CONFIG} found; using defaults");
                Ok(String::new())
            }
        }
    }
}

fn write_file(path: &Utf8Path, data: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_str().is_empty()
    {
        std::fs::create_dir_all(parent).with_context(|| format!("create directory: {}", parent))?;
    }
    std::fs::write(path, data).with_context(|| format!("write: {}", path))?;
    Ok(())
}

fn cmd_md(report_path: Utf8PathBuf, output: Option<Utf8PathBuf>) -> anyhow::Result<()> {
    let report_text = std::fs::read_to_string(&report_path)
        .with_context(|| format!("read report: {}", report_path))?;
    let report = parse_report_json(&report_text)?;
    let md = render_markdown(&to_renderable(&report));

    if let Some(out_path) = output {
        write_file(&out_path, md.as_bytes()).context("write markdown output")?;
    } else {
        print!("{}", md);
    }

    Ok(())
}

fn cmd_annotations(report_path: Utf8PathBuf, max: usize) -> anyhow::Result<()> {
    let report_text = std::fs::read_to_string(&report_path)
        .with_context(|| format!("read report: {}", report_path))?;
    let report = parse_report_json(&report_text)?;

    for annotation in render_annotations(&to_renderable(&report), max) {
        println!("{}", annotation);
    }

    Ok(())
}

fn cmd_explain(identifier: &str) -> anyhow::Result<()> {
    match run_explain(identifier) {
        ExplainOutput::Found {
            identifier,
            topic,
            explanation,
        } => {
            print!(
                "{}",
                gatecheck_app::format_explanation(&identifier, topic, &explanation)
            );
            Ok(())
        }
        ExplainOutput::NotFound {
            identifier,
            available_codes,
            available_assertions,
        } => {
            eprint!(
                "{}",
                gatecheck_app::format_not_found(&identifier, available_codes, available_assertions)
            );
            std::process::exit(1);
        }
    }
}
