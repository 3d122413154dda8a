// src/remote/tracker.rs

//! Trigger → poll state machine for a single remote run.
//!
//! ```text
//! trigger ──err──────────────────────────────► Unknown
//!    │
//!    ▼
//! Queued ─┐
//!         ├─ sleep(interval); poll ──► Success | Failed
//! Running ┘          │
//!                    └──err──────────────────► Unknown
//! ```
//!
//! Each poll is a fresh status read; a run is never re-triggered. Any error
//! ends the loop, so a persistently failing network cannot spin forever.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::types::RunState;

use super::client::{JobClient, RunHandle};

/// Final outcome of one job run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalResult {
    pub job: String,
    /// `None` when the trigger itself failed.
    pub run_id: Option<String>,
    pub state: RunState,
    /// Description of the error that forced `Unknown`.
    pub error: Option<String>,
    /// Number of status polls issued.
    pub polls: u32,
}

impl TerminalResult {
    pub fn is_success(&self) -> bool {
        self.state == RunState::Success
    }
}

pub struct RunTracker<C> {
    client: Arc<C>,
    poll_interval: Duration,
}

impl<C> Clone for RunTracker<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            poll_interval: self.poll_interval,
        }
    }
}

impl<C: JobClient> RunTracker<C> {
    pub fn new(client: Arc<C>, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval,
        }
    }

    /// Trigger `job` and follow it until it reaches a terminal state.
    ///
    /// Never fails: transport and decode errors end up as `Unknown` in the
    /// returned result.
    pub async fn start(&self, job: &str, payload: Option<&str>) -> TerminalResult {
        let triggered = match self.client.trigger(job, payload).await {
            Ok(t) => t,
            Err(err) => {
                error!(job, error = %err, "failed to trigger job");
                return TerminalResult {
                    job: job.to_string(),
                    run_id: None,
                    state: RunState::Unknown,
                    error: Some(err.to_string()),
                    polls: 0,
                };
            }
        };

        info!(
            job,
            run_id = %triggered.handle.run_id,
            state = %triggered.state,
            "job triggered"
        );
        self.follow(job, triggered.handle, triggered.state).await
    }

    async fn follow(&self, job: &str, handle: RunHandle, initial: RunState) -> TerminalResult {
        let mut state = initial;
        let mut polls = 0u32;
        let mut last_error = None;

        while !state.is_terminal() {
            info!(job, run_id = %handle.run_id, %state, "waiting for job to finish");
            sleep(self.poll_interval).await;

            polls += 1;
            match self.client.poll_status(&handle).await {
                Ok(observed) => {
                    debug!(job, run_id = %handle.run_id, state = %observed, polls, "polled job");
                    state = observed;
                }
                Err(err) => {
                    warn!(job, run_id = %handle.run_id, error = %err, "status poll failed; giving up on run");
                    state = RunState::Unknown;
                    last_error = Some(err.to_string());
                }
            }
        }

        match state {
            RunState::Success => info!(job, run_id = %handle.run_id, polls, "job executed successfully"),
            RunState::Failed => error!(job, run_id = %handle.run_id, polls, "job failed"),
            _ => error!(job, run_id = %handle.run_id, "could not determine final state of job"),
        }

        TerminalResult {
            job: job.to_string(),
            run_id: Some(handle.run_id),
            state,
            error: last_error,
            polls,
        }
    }
}
