// src/flow/preview.rs

//! Dry-run support: what a flow would do, without touching the network.

use crate::config::FlowPlan;
use crate::dates;
use crate::errors::Result;
use crate::payload::{JobVariables, PayloadRenderer};

/// One job as it would be triggered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedJob {
    pub date: String,
    /// Zero-based step index.
    pub step: usize,
    pub job: String,
    pub parallel: bool,
    pub payload: Option<String>,
}

/// Expand dates and render every payload in execution order.
///
/// Fails on the same configuration and template errors a real run would hit
/// before its first trigger.
pub fn preview(
    plan: &FlowPlan,
    date_spec: &str,
    renderer: &PayloadRenderer,
    env: &str,
) -> Result<Vec<PlannedJob>> {
    let dates = dates::expand(date_spec)?;
    let mut planned = Vec::new();

    for date in dates {
        let vars = JobVariables::new(date.as_str(), env);
        for (idx, step) in plan.steps().iter().enumerate() {
            let parallel = step.jobs().len() > 1;
            for job in step.jobs() {
                planned.push(PlannedJob {
                    date: date.clone(),
                    step: idx,
                    job: job.clone(),
                    parallel,
                    payload: renderer.render(job, &vars)?,
                });
            }
        }
    }

    Ok(planned)
}
