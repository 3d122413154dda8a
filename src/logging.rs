// src/logging.rs

//! Logging setup for `airflow-runner` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `AIRFLOW_RUNNER_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`
//!
//! Console logs go to STDERR so that stdout only carries the run report.
//! Optionally every event is also written, without ANSI colours, to a log
//! file named after the flow file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use crate::cli::LogLevel;

/// Initialise the global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>, log_file: Option<&Path>) -> Result<()> {
    let level = match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => std::env::var("AIRFLOW_RUNNER_LOG")
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(tracing::Level::INFO),
    };

    let console = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr);

    let file = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("creating log dir {:?}", parent))?;
                }
            }
            let handle = open_log_file(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(Mutex::new(handle)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| anyhow!("initialising logging: {e}"))?;

    if let Some(path) = log_file {
        tracing::info!(log_file = %path.display(), "logging configured");
    }

    Ok(())
}

/// `<log_dir>/<flow stem>_<timestamp>_<pid>.log`.
pub fn log_file_path(log_dir: &Path, flow_path: &Path) -> PathBuf {
    let stem = flow_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("flow");
    let stamp = chrono::Local::now().format("%Y%m%dT%H%M%S%3f");
    log_dir.join(format!("{stem}_{stamp}_{}.log", std::process::id()))
}

// Append so that a name collision never loses another run's log.
fn open_log_file(path: &Path) -> Result<fs::File> {
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {:?}", path))
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_is_named_after_flow() {
        let path = log_file_path(Path::new("log"), Path::new("flows/nightly.yaml"));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(path.starts_with("log"));
        assert!(name.starts_with("nightly_"));
        assert!(name.ends_with(&format!("_{}.log", std::process::id())));
    }

    #[test]
    fn existing_log_file_is_appended_to() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nightly.log");
        fs::write(&path, "earlier run\n").unwrap();

        {
            use std::io::Write;
            let mut file = open_log_file(&path).unwrap();
            writeln!(file, "this run").unwrap();
        }

        assert_eq!(fs::read_to_string(&path).unwrap(), "earlier run\nthis run\n");
    }

    #[test]
    fn level_strings_are_lenient() {
        assert_eq!(parse_level_str(" WARNING "), Some(tracing::Level::WARN));
        assert_eq!(parse_level_str("verbose"), None);
    }
}
