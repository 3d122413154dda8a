// src/flow/executor.rs

use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::config::FlowPlan;
use crate::dates;
use crate::errors::{Result, RunnerError};
use crate::payload::{JobVariables, PayloadRenderer};
use crate::remote::{JobClient, RunTracker, TerminalResult};
use crate::types::{FailurePolicy, RunState};

use super::report::FlowReport;
use super::step::StepKind;

/// A flow stopped by a fatal error, together with the runs that finished
/// before it.
#[derive(Debug, thiserror::Error)]
#[error("flow stopped early: {error}")]
pub struct FlowStopped {
    /// Marked aborted; holds every outcome recorded before the error.
    pub report: FlowReport,
    #[source]
    pub error: RunnerError,
}

/// Runs a [`FlowPlan`] for every date of a date specification.
///
/// Ordering guarantees:
/// - dates run one after another, in expanded order;
/// - within a date, steps run strictly in plan order;
/// - the jobs of a multi-job step run concurrently and the step ends only
///   when every one of them is terminal.
///
/// A failed or unknown run never cancels its siblings. Whether later steps
/// still run is decided by the [`FailurePolicy`].
pub struct FlowExecutor<C> {
    tracker: RunTracker<C>,
    renderer: PayloadRenderer,
    env: String,
    policy: FailurePolicy,
}

impl<C: JobClient + 'static> FlowExecutor<C> {
    pub fn new(
        tracker: RunTracker<C>,
        renderer: PayloadRenderer,
        env: impl Into<String>,
        policy: FailurePolicy,
    ) -> Self {
        Self {
            tracker,
            renderer,
            env: env.into(),
            policy,
        }
    }

    /// Execute `plan` for every date in `date_spec`.
    ///
    /// Only problems that make the rest of the run meaningless (bad date
    /// spec, broken payload template) stop the flow; the partial report comes
    /// back with the error. Per-job failures are part of the returned report.
    pub async fn run(&self, plan: &FlowPlan, date_spec: &str) -> std::result::Result<FlowReport, FlowStopped> {
        let dates = match dates::expand(date_spec) {
            Ok(dates) => dates,
            Err(error) => {
                let mut report = FlowReport::new(Vec::new());
                report.mark_aborted();
                return Err(FlowStopped { report, error });
            }
        };
        let mut report = FlowReport::new(dates.clone());

        if plan.is_empty() {
            info!("no jobs to run");
            return Ok(report);
        }

        info!(?dates, steps = plan.steps().len(), "starting flow");

        'dates: for date in dates.iter() {
            let span = info_span!("flow", date = %date);
            for (idx, step) in plan.steps().iter().enumerate() {
                let kind = StepKind::from(step);
                debug!(date = %date, step = idx + 1, jobs = kind.job_count(), "starting step");
                let results = match self.execute_step(kind, date).instrument(span.clone()).await {
                    Ok(results) => results,
                    Err(error) => {
                        error!(date = %date, step = idx + 1, error = %error, "stopping flow");
                        report.mark_aborted();
                        return Err(FlowStopped { report, error });
                    }
                };

                let step_failed = results.iter().any(|r| !r.is_success());
                report.record(date, idx, results);

                if step_failed && self.policy == FailurePolicy::Abort {
                    warn!(date = %date, step = idx + 1, "step had failures; skipping the rest of the flow");
                    report.mark_aborted();
                    break 'dates;
                }
            }
            info!(date = %date, "finished all steps for date");
        }

        Ok(report)
    }

    /// Dispatch one step according to its kind.
    pub async fn execute_step(&self, kind: StepKind<'_>, date: &str) -> Result<Vec<TerminalResult>> {
        match kind {
            StepKind::Serial(job) => Ok(vec![self.execute_job(job, date).await?]),
            StepKind::Parallel(jobs) => self.execute_parallel_jobs(jobs, date).await,
        }
    }

    /// Render the payload for `job` and follow its run to completion.
    pub async fn execute_job(&self, job: &str, date: &str) -> Result<TerminalResult> {
        let payload = self.renderer.render(job, &self.variables(date))?;
        let span = info_span!("job", job, date);
        Ok(self.tracker.start(job, payload.as_deref()).instrument(span).await)
    }

    /// Run all `jobs` concurrently for `date`.
    ///
    /// Every payload is rendered before anything is triggered, so a broken
    /// template aborts the step without leaving half of it running. Results
    /// come back in the order of `jobs`.
    pub async fn execute_parallel_jobs(&self, jobs: &[String], date: &str) -> Result<Vec<TerminalResult>> {
        let vars = self.variables(date);
        let mut payloads = Vec::with_capacity(jobs.len());
        for job in jobs {
            payloads.push((job.clone(), self.renderer.render(job, &vars)?));
        }

        let handles: Vec<(String, JoinHandle<TerminalResult>)> = payloads
            .into_iter()
            .map(|(job, payload)| {
                let tracker = self.tracker.clone();
                let span = info_span!("job", job = %job, date);
                let name = job.clone();
                let handle = tokio::spawn(
                    async move { tracker.start(&job, payload.as_deref()).await }.instrument(span),
                );
                (name, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (job, handle) in handles {
            match handle.await {
                Ok(result) => results.push(result),
                Err(err) => {
                    error!(job = %job, date, error = %err, "job task ended abnormally");
                    results.push(TerminalResult {
                        job,
                        run_id: None,
                        state: RunState::Unknown,
                        error: Some(format!("job task ended abnormally: {err}")),
                        polls: 0,
                    });
                }
            }
        }
        Ok(results)
    }

    fn variables(&self, date: &str) -> JobVariables {
        JobVariables::new(date, self.env.as_str())
    }
}
