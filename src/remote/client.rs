// src/remote/client.rs

//! Client for the Airflow "DAG run" REST endpoints.
//!
//! - trigger: `POST {host}/api/v1/dags/{job}/dagRuns`
//! - status:  `GET  {host}/api/v1/dags/{job}/dagRuns/{run_id}`
//!
//! Each call is a single request: no retries happen here.

use std::future::Future;
use std::pin::Pin;

use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

use crate::errors::{Result, RunnerError};
use crate::types::RunState;

use super::transport::{BasicAuth, HttpRequest, HttpResponse, Method, Transport};

/// How much of an error response body is kept in error messages.
const MAX_ERROR_BODY: usize = 512;

/// Identifies one triggered remote run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHandle {
    pub job_id: String,
    pub run_id: String,
}

/// Result of a successful trigger: the new run and its first reported state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggeredRun {
    pub handle: RunHandle,
    pub state: RunState,
}

/// DAG run descriptor returned by both endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct DagRun {
    pub dag_id: String,
    pub dag_run_id: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub conf: Option<serde_json::Value>,
    #[serde(default)]
    pub logical_date: Option<String>,
    #[serde(default)]
    pub execution_date: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub external_trigger: Option<bool>,
}

impl DagRun {
    /// Known state of this run, or a `DecodeError` when the remote reported
    /// something this client does not understand.
    pub fn run_state(&self) -> Result<RunState> {
        self.state
            .as_deref()
            .and_then(RunState::from_remote)
            .ok_or_else(|| {
                RunnerError::DecodeError(format!(
                    "unrecognised state {:?} for run '{}' of '{}'",
                    self.state, self.dag_run_id, self.dag_id
                ))
            })
    }
}

pub type ClientFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// The two remote operations the run tracker needs.
///
/// Production code uses [`RemoteJobClient`]; tests provide scripted
/// implementations.
pub trait JobClient: Send + Sync {
    /// Ask the remote system to start `job` with the given JSON body
    /// (`{}` when `None`).
    fn trigger<'a>(&'a self, job: &'a str, payload: Option<&'a str>) -> ClientFuture<'a, TriggeredRun>;

    /// Read the current state of a run.
    fn poll_status<'a>(&'a self, handle: &'a RunHandle) -> ClientFuture<'a, RunState>;
}

pub struct RemoteJobClient<T> {
    transport: T,
    base: Url,
    auth: Option<BasicAuth>,
}

impl<T: Transport> RemoteJobClient<T> {
    /// Build a client for `host` (`localhost:8080`, `https://airflow.example.com/`,
    /// ...). A host that does not form a valid base URL is a `ConfigError`.
    pub fn new(transport: T, host: &str, auth: Option<BasicAuth>) -> Result<Self> {
        let base = parse_host(host)?;
        Ok(Self {
            transport,
            base,
            auth,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// URL of the collection of runs of `job`.
    pub fn dag_runs_url(&self, job: &str) -> Result<Url> {
        self.url_with(&["api", "v1", "dags", job, "dagRuns"])
    }

    /// URL of one run.
    pub fn dag_run_url(&self, handle: &RunHandle) -> Result<Url> {
        self.url_with(&[
            "api",
            "v1",
            "dags",
            handle.job_id.as_str(),
            "dagRuns",
            handle.run_id.as_str(),
        ])
    }

    fn url_with(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| RunnerError::ConfigError(format!("host '{}' cannot be a base URL", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn trigger_inner(&self, job: &str, payload: Option<&str>) -> Result<TriggeredRun> {
        let request = HttpRequest {
            method: Method::Post,
            url: self.dag_runs_url(job)?.to_string(),
            body: Some(payload.unwrap_or("{}").to_string()),
            auth: self.auth.clone(),
        };
        let run = decode(self.transport.send(request).await?)?;
        debug!(
            job = %run.dag_id,
            run_id = %run.dag_run_id,
            logical_date = ?run.logical_date,
            "triggered dag run"
        );
        let state = run.run_state()?;
        Ok(TriggeredRun {
            handle: RunHandle {
                job_id: run.dag_id,
                run_id: run.dag_run_id,
            },
            state,
        })
    }

    async fn poll_inner(&self, handle: &RunHandle) -> Result<RunState> {
        let request = HttpRequest {
            method: Method::Get,
            url: self.dag_run_url(handle)?.to_string(),
            body: None,
            auth: self.auth.clone(),
        };
        let run = decode(self.transport.send(request).await?)?;
        run.run_state()
    }
}

impl<T: Transport> JobClient for RemoteJobClient<T> {
    fn trigger<'a>(&'a self, job: &'a str, payload: Option<&'a str>) -> ClientFuture<'a, TriggeredRun> {
        Box::pin(self.trigger_inner(job, payload))
    }

    fn poll_status<'a>(&'a self, handle: &'a RunHandle) -> ClientFuture<'a, RunState> {
        Box::pin(self.poll_inner(handle))
    }
}

fn parse_host(host: &str) -> Result<Url> {
    let trimmed = host.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(RunnerError::ConfigError("host must not be empty".to_string()));
    }
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };

    let url = Url::parse(&with_scheme)
        .map_err(|e| RunnerError::ConfigError(format!("invalid host '{host}': {e}")))?;
    if url.cannot_be_a_base() {
        return Err(RunnerError::ConfigError(format!(
            "host '{host}' cannot be a base URL"
        )));
    }
    Ok(url)
}

fn decode(response: HttpResponse) -> Result<DagRun> {
    if !response.is_success() {
        return Err(RunnerError::HttpStatus {
            status: response.status,
            body: response.body.chars().take(MAX_ERROR_BODY).collect(),
        });
    }
    serde_json::from_str(&response.body)
        .map_err(|e| RunnerError::DecodeError(format!("decoding dag run: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_without_scheme_gets_http() {
        assert_eq!(parse_host("localhost:8080").unwrap().as_str(), "http://localhost:8080/");
        assert_eq!(
            parse_host("https://airflow.example.com/").unwrap().as_str(),
            "https://airflow.example.com/"
        );
    }

    #[test]
    fn empty_host_is_a_config_error() {
        assert!(matches!(parse_host("  "), Err(RunnerError::ConfigError(_))));
    }

    #[test]
    fn state_mapping_is_case_sensitive() {
        let run: DagRun =
            serde_json::from_str(r#"{"dag_id":"a","dag_run_id":"r","state":"SUCCESS"}"#).unwrap();
        assert!(matches!(run.run_state(), Err(RunnerError::DecodeError(_))));
    }
}
