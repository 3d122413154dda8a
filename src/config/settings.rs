// src/config/settings.rs

//! Merge CLI flags, environment variables and the settings file into one
//! immutable [`Settings`] value.
//!
//! Precedence for every key: explicit flag, then `AIRFLOW_RUNNER_<KEY>`,
//! then the settings file, then the built-in default.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cli::CliArgs;
use crate::config::model::{Settings, SettingsFile};
use crate::errors::{Result, RunnerError};
use crate::remote::BasicAuth;
use crate::types::FailurePolicy;

pub const ENV_PREFIX: &str = "AIRFLOW_RUNNER_";

const DEFAULT_HOST: &str = "localhost:8080";
const DEFAULT_ENV: &str = "dev";
const DEFAULT_LOG_DIR: &str = "log";
const DEFAULT_TEMPLATES_DIR: &str = ".";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

impl Settings {
    /// Resolve settings against the real process environment and today's
    /// local date.
    pub fn resolve(args: &CliArgs, file: SettingsFile) -> Result<Self> {
        let today = chrono::Local::now().format("%Y-%m-%d").to_string();
        Self::resolve_with(args, file, |key| std::env::var(key).ok(), &today)
    }

    /// Same as [`Settings::resolve`] with an injectable environment lookup.
    pub fn resolve_with<F>(args: &CliArgs, file: SettingsFile, env: F, today: &str) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| env(&format!("{ENV_PREFIX}{}", key.to_uppercase()));

        let pick = |flag: &Option<String>, key: &str, from_file: &Option<String>, default: &str| {
            flag.clone()
                .or_else(|| lookup(key))
                .or_else(|| from_file.clone())
                .unwrap_or_else(|| default.to_string())
        };

        let host = pick(&args.host, "host", &file.host, DEFAULT_HOST);
        let env_name = pick(&args.env, "env", &file.env, DEFAULT_ENV);
        let date = pick(&args.date, "date", &file.date, today);
        let templates_dir = pick(
            &args.templates_dir,
            "templates_dir",
            &file.templates_dir,
            DEFAULT_TEMPLATES_DIR,
        );
        let log_dir = pick(&args.log_dir, "logdir", &file.logdir, DEFAULT_LOG_DIR);

        let on_failure = match args.on_failure {
            Some(policy) => policy,
            None => match lookup("on_failure") {
                Some(raw) => FailurePolicy::from_str(&raw).map_err(RunnerError::ConfigError)?,
                None => file.on_failure.unwrap_or_default(),
            },
        };

        let uname = lookup("uname").or(file.uname);
        let pass = lookup("pass").or(file.pass);
        let auth = match (uname, pass) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Some(BasicAuth { username, password })
            }
            _ => None,
        };

        let poll_interval = seconds(
            "poll_interval_secs",
            lookup("poll_interval_secs"),
            file.poll_interval_secs,
            DEFAULT_POLL_INTERVAL_SECS,
        )?;
        let request_timeout = seconds(
            "request_timeout_secs",
            lookup("request_timeout_secs"),
            file.request_timeout_secs,
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;

        Ok(Settings {
            config_path: None,
            flow_path: PathBuf::from(&args.flow),
            host,
            env: env_name,
            date,
            auth,
            templates_dir: PathBuf::from(templates_dir),
            on_failure,
            log_dir: PathBuf::from(log_dir),
            log_to_file: !args.no_log_file,
            poll_interval,
            request_timeout,
            dry_run: args.dry_run,
        })
    }
}

fn seconds(key: &str, from_env: Option<String>, from_file: Option<u64>, default: u64) -> Result<Duration> {
    let secs = match from_env {
        Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
            RunnerError::ConfigError(format!("{ENV_PREFIX}{}: {e}", key.to_uppercase()))
        })?,
        None => from_file.unwrap_or(default),
    };
    if secs == 0 {
        return Err(RunnerError::ConfigError(format!("{key} must be >= 1 (got 0)")));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use clap::Parser;

    use super::*;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["airflow-runner", "--flow", "flow.yaml"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let s = Settings::resolve_with(&args(&[]), SettingsFile::default(), env_of(&[]), "2024-03-01")
            .unwrap();
        assert_eq!(s.host, "localhost:8080");
        assert_eq!(s.env, "dev");
        assert_eq!(s.date, "2024-03-01");
        assert_eq!(s.on_failure, FailurePolicy::Continue);
        assert_eq!(s.poll_interval, Duration::from_secs(10));
        assert_eq!(s.request_timeout, Duration::from_secs(10));
        assert!(s.auth.is_none());
        assert!(s.log_to_file);
    }

    #[test]
    fn flag_beats_env_beats_file() {
        let file = SettingsFile {
            host: Some("file-host:1".into()),
            env: Some("file-env".into()),
            date: Some("2020-01-01".into()),
            ..SettingsFile::default()
        };
        let env = env_of(&[
            ("AIRFLOW_RUNNER_HOST", "env-host:2"),
            ("AIRFLOW_RUNNER_ENV", "env-env"),
        ]);
        let s = Settings::resolve_with(&args(&["--host", "flag-host:3"]), file, env, "2024-03-01")
            .unwrap();
        assert_eq!(s.host, "flag-host:3");
        assert_eq!(s.env, "env-env");
        assert_eq!(s.date, "2020-01-01");
    }

    #[test]
    fn credentials_need_both_parts() {
        let file = SettingsFile {
            uname: Some("airflow".into()),
            ..SettingsFile::default()
        };
        let s = Settings::resolve_with(&args(&[]), file.clone(), env_of(&[]), "2024-03-01").unwrap();
        assert!(s.auth.is_none());

        let env = env_of(&[("AIRFLOW_RUNNER_PASS", "secret")]);
        let s = Settings::resolve_with(&args(&[]), file, env, "2024-03-01").unwrap();
        let auth = s.auth.unwrap();
        assert_eq!(auth.username, "airflow");
        assert_eq!(auth.password, "secret");
    }

    #[test]
    fn invalid_policy_from_env_is_a_config_error() {
        let env = env_of(&[("AIRFLOW_RUNNER_ON_FAILURE", "retry")]);
        let err = Settings::resolve_with(&args(&[]), SettingsFile::default(), env, "2024-03-01")
            .unwrap_err();
        assert!(matches!(err, RunnerError::ConfigError(_)));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let file = SettingsFile {
            poll_interval_secs: Some(0),
            ..SettingsFile::default()
        };
        let err = Settings::resolve_with(&args(&[]), file, env_of(&[]), "2024-03-01").unwrap_err();
        assert!(matches!(err, RunnerError::ConfigError(_)));
    }
}
