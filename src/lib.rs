// src/lib.rs

pub mod cli;
pub mod config;
pub mod dates;
pub mod errors;
pub mod flow;
pub mod fs;
pub mod logging;
pub mod payload;
pub mod remote;
pub mod types;

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::{Settings, load_flow, load_settings_file, settings_path};
use crate::errors::Result;
use crate::flow::{FlowExecutor, FlowReport, PlannedJob, preview};
use crate::fs::RealFileSystem;
use crate::payload::PayloadRenderer;
use crate::remote::{LoggingTransport, RemoteJobClient, ReqwestTransport, RunTracker};

/// Exit code when the flow ran to the end but some run did not succeed.
pub const EXIT_RUNS_FAILED: i32 = 2;
/// Exit code after Ctrl-C.
pub const EXIT_INTERRUPTED: i32 = 130;

/// How an invocation ended.
#[derive(Debug)]
pub enum RunOutcome {
    Completed(FlowReport),
    DryRun(Vec<PlannedJob>),
    Interrupted,
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Completed(report) if report.all_succeeded() => 0,
            RunOutcome::Completed(_) => EXIT_RUNS_FAILED,
            RunOutcome::DryRun(_) => 0,
            RunOutcome::Interrupted => EXIT_INTERRUPTED,
        }
    }
}

/// Resolve the effective settings for `args`.
///
/// Runs before logging is set up, so it does not log.
pub fn load_settings(args: &CliArgs) -> Result<Settings> {
    let path = settings_path(args.config.as_deref().map(Path::new));
    let file = load_settings_file(path.as_deref())?;
    let mut settings = Settings::resolve(args, file)?;
    settings.config_path = path;
    Ok(settings)
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - flow loading and validation
/// - payload rendering
/// - the HTTP client stack (reqwest + request logging)
/// - the flow executor
/// - Ctrl-C handling
pub async fn run(settings: &Settings) -> Result<RunOutcome> {
    info!(version = env!("CARGO_PKG_VERSION"), "running airflow-runner");
    if let Some(path) = &settings.config_path {
        info!(config = %path.display(), "using config file");
    }

    let plan = load_flow(&settings.flow_path)?;
    let renderer = PayloadRenderer::new(Arc::new(RealFileSystem), &settings.templates_dir);

    if settings.dry_run {
        let planned = preview(&plan, &settings.date, &renderer, &settings.env)?;
        print_dry_run(settings, &planned);
        return Ok(RunOutcome::DryRun(planned));
    }

    let transport = LoggingTransport::new(ReqwestTransport::new(settings.request_timeout)?);
    let client = RemoteJobClient::new(transport, &settings.host, settings.auth.clone())?;
    info!(host = %client.base_url(), env = %settings.env, dates = %settings.date, "connecting to airflow");

    let tracker = RunTracker::new(Arc::new(client), settings.poll_interval);
    let executor = FlowExecutor::new(tracker, renderer, settings.env.clone(), settings.on_failure);

    // In-flight requests and poll loops are simply dropped on Ctrl-C; the
    // process exits right after.
    let interrupted = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    let report = tokio::select! {
        report = executor.run(&plan, &settings.date) => match report {
            Ok(report) => report,
            Err(stopped) => {
                if !stopped.report.outcomes().is_empty() {
                    println!("{}", stopped.report);
                }
                return Err(stopped.error);
            }
        },
        _ = interrupted => {
            warn!("interrupted; abandoning runs in flight");
            return Ok(RunOutcome::Interrupted);
        }
    };

    println!("{report}");
    Ok(RunOutcome::Completed(report))
}

/// Simple dry-run output: dates, steps and rendered payloads.
fn print_dry_run(settings: &Settings, planned: &[PlannedJob]) {
    println!("airflow-runner dry-run");
    println!("  flow = {}", settings.flow_path.display());
    println!("  host = {}", settings.host);
    println!("  env = {}", settings.env);
    println!("  on_failure = {:?}", settings.on_failure);
    println!();

    let mut current: Option<(&str, usize)> = None;
    for job in planned {
        if current != Some((job.date.as_str(), job.step)) {
            let mode = if job.parallel { "parallel" } else { "serial" };
            println!("{} step {} ({mode}):", job.date, job.step + 1);
            current = Some((job.date.as_str(), job.step));
        }
        println!("  - {}", job.job);
        match &job.payload {
            Some(payload) => println!("      payload: {payload}"),
            None => println!("      payload: {{}} (no template)"),
        }
    }
}
