#![allow(dead_code)]

use airflow_runner::config::{FlowPlan, RawFlowPlan, RawStep};

/// Builder for `FlowPlan` to simplify test setup.
pub struct FlowPlanBuilder {
    plan: RawFlowPlan,
}

impl FlowPlanBuilder {
    pub fn new() -> Self {
        Self {
            plan: RawFlowPlan::default(),
        }
    }

    /// Append a step running `jobs` (in parallel when more than one).
    pub fn step(mut self, jobs: &[&str]) -> Self {
        self.plan.jobs.push(RawStep {
            step: jobs.iter().map(|j| j.to_string()).collect(),
        });
        self
    }

    pub fn raw(self) -> RawFlowPlan {
        self.plan
    }

    pub fn build(self) -> FlowPlan {
        FlowPlan::try_from(self.plan).expect("Failed to build valid plan from builder")
    }
}

impl Default for FlowPlanBuilder {
    fn default() -> Self {
        Self::new()
    }
}
