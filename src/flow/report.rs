// src/flow/report.rs

//! Per-date, per-step results of a flow run.

use std::fmt;

use crate::remote::TerminalResult;

/// Result of one job for one date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub date: String,
    /// Zero-based index of the step in the plan.
    pub step: usize,
    pub result: TerminalResult,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowReport {
    dates: Vec<String>,
    outcomes: Vec<JobOutcome>,
    aborted: bool,
}

impl FlowReport {
    pub fn new(dates: Vec<String>) -> Self {
        Self {
            dates,
            outcomes: Vec::new(),
            aborted: false,
        }
    }

    pub(crate) fn record(&mut self, date: &str, step: usize, results: Vec<TerminalResult>) {
        self.outcomes.extend(results.into_iter().map(|result| JobOutcome {
            date: date.to_string(),
            step,
            result,
        }));
    }

    pub(crate) fn mark_aborted(&mut self) {
        self.aborted = true;
    }

    pub fn dates(&self) -> &[String] {
        &self.dates
    }

    /// Outcomes in execution order: dates, then steps, then plan order
    /// within a step.
    pub fn outcomes(&self) -> &[JobOutcome] {
        &self.outcomes
    }

    /// Whether remaining steps were skipped after a failure.
    pub fn aborted(&self) -> bool {
        self.aborted
    }

    pub fn failures(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|o| !o.result.is_success())
    }

    pub fn all_succeeded(&self) -> bool {
        !self.aborted && self.failures().next().is_none()
    }
}

impl fmt::Display for FlowReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.outcomes.is_empty() {
            writeln!(f, "no jobs were run")?;
            return Ok(());
        }

        let job_width = self
            .outcomes
            .iter()
            .map(|o| o.result.job.len())
            .max()
            .unwrap_or(0)
            .max("JOB".len());

        writeln!(f, "{:<10}  {:>4}  {:<job_width$}  {:<8}  RUN", "DATE", "STEP", "JOB", "STATE")?;
        for o in &self.outcomes {
            let run = o.result.run_id.as_deref().unwrap_or("-");
            write!(
                f,
                "{:<10}  {:>4}  {:<job_width$}  {:<8}  {run}",
                o.date,
                o.step + 1,
                o.result.job,
                o.result.state.as_str()
            )?;
            if let Some(err) = &o.result.error {
                write!(f, "  ({err})")?;
            }
            writeln!(f)?;
        }

        let failed = self.failures().count();
        writeln!(
            f,
            "{} run(s), {} succeeded, {} not successful{}",
            self.outcomes.len(),
            self.outcomes.len() - failed,
            failed,
            if self.aborted { "; remaining steps skipped" } else { "" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RunState;

    fn result(job: &str, state: RunState, error: Option<&str>) -> TerminalResult {
        TerminalResult {
            job: job.to_string(),
            run_id: error.is_none().then(|| format!("manual__{job}")),
            state,
            error: error.map(str::to_string),
            polls: 1,
        }
    }

    #[test]
    fn table_lists_every_run_and_a_summary() {
        let mut report = FlowReport::new(vec!["2022-01-01".to_string()]);
        report.record(
            "2022-01-01",
            0,
            vec![
                result("extract", RunState::Success, None),
                result("publish", RunState::Unknown, Some("connection refused")),
            ],
        );
        report.mark_aborted();

        let text = report.to_string();
        assert!(text.starts_with("DATE"));
        assert!(text.contains("manual__extract"));
        assert!(text.contains("unknown"));
        assert!(text.contains("(connection refused)"));
        assert!(text.contains("2 run(s), 1 succeeded, 1 not successful; remaining steps skipped"));
        assert!(!report.all_succeeded());
    }

    #[test]
    fn empty_report_succeeds() {
        let report = FlowReport::new(vec!["2022-01-01".to_string()]);
        assert!(report.all_succeeded());
        assert_eq!(report.to_string(), "no jobs were run\n");
    }
}
