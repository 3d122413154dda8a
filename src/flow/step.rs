// src/flow/step.rs

use crate::config::Step;

/// How a step is executed.
///
/// A step with a single job runs it inline; a step with several jobs fans
/// them out concurrently and waits for all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind<'a> {
    Serial(&'a str),
    Parallel(&'a [String]),
}

impl<'a> From<&'a Step> for StepKind<'a> {
    fn from(step: &'a Step) -> Self {
        match step.jobs() {
            [only] => StepKind::Serial(only.as_str()),
            jobs => StepKind::Parallel(jobs),
        }
    }
}

impl StepKind<'_> {
    pub fn job_count(&self) -> usize {
        match self {
            StepKind::Serial(_) => 1,
            StepKind::Parallel(jobs) => jobs.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FlowPlan, RawFlowPlan, RawStep};

    fn plan(steps: &[&[&str]]) -> FlowPlan {
        let raw = RawFlowPlan {
            jobs: steps
                .iter()
                .map(|jobs| RawStep {
                    step: jobs.iter().map(|j| j.to_string()).collect(),
                })
                .collect(),
        };
        FlowPlan::try_from(raw).unwrap()
    }

    #[test]
    fn single_job_steps_are_serial() {
        let plan = plan(&[&["a"], &["b", "c"]]);
        let kinds: Vec<_> = plan.steps().iter().map(StepKind::from).collect();

        assert_eq!(kinds[0], StepKind::Serial("a"));
        assert_eq!(kinds[1].job_count(), 2);
        assert!(matches!(kinds[1], StepKind::Parallel(_)));
    }
}
