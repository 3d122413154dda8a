use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use tokio::time::Instant;

use airflow_runner::errors::RunnerError;
use airflow_runner::remote::client::ClientFuture;
use airflow_runner::remote::{JobClient, RunHandle, TriggeredRun};
use airflow_runner::types::RunState;

/// One scripted answer from the fake remote system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    State(RunState),
    /// Answer with a `TransportError` carrying this message.
    Error(String),
}

/// What the fake remote does for every run of one job.
#[derive(Debug, Clone)]
pub struct JobScript {
    pub trigger: Reply,
    pub polls: Vec<Reply>,
}

impl JobScript {
    /// Trigger reports `initial`; successive polls report `polls`.
    pub fn states(initial: RunState, polls: &[RunState]) -> Self {
        Self {
            trigger: Reply::State(initial),
            polls: polls.iter().copied().map(Reply::State).collect(),
        }
    }

    /// Queued on trigger, then `running` for `running_polls` polls, then success.
    pub fn succeeds_after(running_polls: usize) -> Self {
        Self::ends_after(running_polls, RunState::Success)
    }

    /// Queued on trigger, then `running` for `running_polls` polls, then failed.
    pub fn fails_after(running_polls: usize) -> Self {
        Self::ends_after(running_polls, RunState::Failed)
    }

    fn ends_after(running_polls: usize, last: RunState) -> Self {
        let mut polls = vec![RunState::Running; running_polls];
        polls.push(last);
        Self::states(RunState::Queued, &polls)
    }

    pub fn trigger_error(msg: &str) -> Self {
        Self {
            trigger: Reply::Error(msg.to_string()),
            polls: Vec::new(),
        }
    }

    /// Append a transport error to the poll sequence.
    pub fn then_error(mut self, msg: &str) -> Self {
        self.polls.push(Reply::Error(msg.to_string()));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Trigger,
    Poll,
}

/// A call observed by the [`ScriptedClient`].
#[derive(Debug, Clone)]
pub struct ClientCall {
    pub kind: CallKind,
    pub job: String,
    pub run_id: Option<String>,
    pub payload: Option<String>,
    pub at: Instant,
}

#[derive(Debug, Default)]
struct Inner {
    scripts: HashMap<String, JobScript>,
    runs: HashMap<String, VecDeque<Reply>>,
    calls: Vec<ClientCall>,
    run_counter: u64,
}

/// A `JobClient` that answers from per-job scripts and records every call
/// with its (tokio) timestamp.
///
/// Each trigger starts a fresh copy of the job's poll script, so the same
/// job can be run for several dates. Jobs without a script use the default
/// (`JobScript::succeeds_after(0)` unless overridden). A poll past the end
/// of a script answers with an error.
#[derive(Debug)]
pub struct ScriptedClient {
    inner: Mutex<Inner>,
    default: JobScript,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            default: JobScript::succeeds_after(0),
        }
    }

    pub fn with_default(mut self, script: JobScript) -> Self {
        self.default = script;
        self
    }

    pub fn with_job(self, job: &str, script: JobScript) -> Self {
        self.inner
            .lock()
            .unwrap()
            .scripts
            .insert(job.to_string(), script);
        self
    }

    pub fn calls(&self) -> Vec<ClientCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn calls_for(&self, job: &str, kind: CallKind) -> Vec<ClientCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.job == job && c.kind == kind)
            .collect()
    }

    /// Job names in the order they were triggered.
    pub fn triggered_jobs(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.kind == CallKind::Trigger)
            .map(|c| c.job)
            .collect()
    }

    fn do_trigger(&self, job: &str, payload: Option<&str>) -> Result<TriggeredRun, RunnerError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(ClientCall {
            kind: CallKind::Trigger,
            job: job.to_string(),
            run_id: None,
            payload: payload.map(str::to_string),
            at: Instant::now(),
        });

        let script = inner
            .scripts
            .get(job)
            .cloned()
            .unwrap_or_else(|| self.default.clone());

        match script.trigger {
            Reply::Error(msg) => Err(RunnerError::TransportError(msg)),
            Reply::State(state) => {
                inner.run_counter += 1;
                let run_id = format!("manual__{job}__{}", inner.run_counter);
                inner
                    .runs
                    .insert(run_id.clone(), script.polls.into_iter().collect());
                Ok(TriggeredRun {
                    handle: RunHandle {
                        job_id: job.to_string(),
                        run_id,
                    },
                    state,
                })
            }
        }
    }

    fn do_poll(&self, handle: &RunHandle) -> Result<RunState, RunnerError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(ClientCall {
            kind: CallKind::Poll,
            job: handle.job_id.clone(),
            run_id: Some(handle.run_id.clone()),
            payload: None,
            at: Instant::now(),
        });

        let next = inner
            .runs
            .get_mut(&handle.run_id)
            .and_then(|queue| queue.pop_front());
        match next {
            Some(Reply::State(state)) => Ok(state),
            Some(Reply::Error(msg)) => Err(RunnerError::TransportError(msg)),
            None => Err(RunnerError::TransportError(format!(
                "no scripted reply left for {}",
                handle.run_id
            ))),
        }
    }
}

impl Default for ScriptedClient {
    fn default() -> Self {
        Self::new()
    }
}

impl JobClient for ScriptedClient {
    fn trigger<'a>(&'a self, job: &'a str, payload: Option<&'a str>) -> ClientFuture<'a, TriggeredRun> {
        Box::pin(async move { self.do_trigger(job, payload) })
    }

    fn poll_status<'a>(&'a self, handle: &'a RunHandle) -> ClientFuture<'a, RunState> {
        Box::pin(async move { self.do_poll(handle) })
    }
}
