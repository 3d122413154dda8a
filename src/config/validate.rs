// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{FlowPlan, RawFlowPlan, RawStep, Step};
use crate::errors::{Result, RunnerError};

impl TryFrom<RawFlowPlan> for FlowPlan {
    type Error = crate::errors::RunnerError;

    fn try_from(raw: RawFlowPlan) -> std::result::Result<Self, Self::Error> {
        let mut steps = Vec::with_capacity(raw.jobs.len());
        for (idx, step) in raw.jobs.into_iter().enumerate() {
            validate_step(idx, &step)?;
            steps.push(Step::new_unchecked(step.step));
        }
        Ok(FlowPlan::new_unchecked(steps))
    }
}

fn validate_step(idx: usize, step: &RawStep) -> Result<()> {
    // Steps are numbered from 1 in messages, matching the order in the file.
    let number = idx + 1;

    if step.step.is_empty() {
        return Err(RunnerError::ConfigError(format!(
            "step {number} has no jobs"
        )));
    }

    let mut seen = HashSet::new();
    for job in step.step.iter() {
        validate_job_name(number, job)?;
        if !seen.insert(job.as_str()) {
            return Err(RunnerError::ConfigError(format!(
                "job '{job}' is listed more than once in step {number}"
            )));
        }
    }
    Ok(())
}

fn validate_job_name(number: usize, job: &str) -> Result<()> {
    if job.trim().is_empty() {
        return Err(RunnerError::ConfigError(format!(
            "step {number} contains an empty job name"
        )));
    }
    if job.contains('/') {
        return Err(RunnerError::ConfigError(format!(
            "job name '{job}' in step {number} must not contain '/'"
        )));
    }
    Ok(())
}
