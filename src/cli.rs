// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Every option that can also come from the settings file is an `Option`
//! here, so that [`crate::config::Settings::resolve`] can tell an explicit
//! flag apart from "not given".

use clap::{Parser, ValueEnum};

use crate::types::FailurePolicy;

/// Command-line arguments for `airflow-runner`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "airflow-runner",
    version,
    about = "A tool to run airflow jobs concurrently",
    long_about = "airflow-runner triggers the jobs of a flow file against an Airflow \
                  REST API for one or more dates, running the jobs of a step in \
                  parallel and waiting for every run to finish."
)]
pub struct CliArgs {
    /// Settings file (YAML, TOML or JSON).
    ///
    /// Default: `$HOME/.airflowrun.yaml`, silently skipped if missing.
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<String>,

    /// Flow file describing the steps to run.
    #[arg(short = 'f', long, value_name = "PATH")]
    pub flow: String,

    /// Host and port of the Airflow webserver.
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Dates to run for: `yyyy-MM-dd,yyyy-MM-dd` or `yyyy-MM-dd:yyyy-MM-dd`.
    ///
    /// Defaults to today.
    #[arg(long, value_name = "DATES")]
    pub date: Option<String>,

    /// Environment name exposed to payload templates as `Env`.
    #[arg(long, value_name = "ENV")]
    pub env: Option<String>,

    /// Directory holding `<job>.json` and `default_data.json` templates.
    #[arg(long, value_name = "DIR")]
    pub templates_dir: Option<String>,

    /// What to do after a step with a failed run.
    #[arg(long, value_enum, value_name = "POLICY")]
    pub on_failure: Option<FailurePolicy>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `AIRFLOW_RUNNER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Directory for the per-invocation log file.
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<String>,

    /// Only log to stderr.
    #[arg(long)]
    pub no_log_file: bool,

    /// Expand dates and render payloads, but don't trigger anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
