// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::remote::BasicAuth;
use crate::types::FailurePolicy;

/// Flow file as read from disk, before validation.
///
/// ```yaml
/// jobs:
///   - step: [extract_trades]
///   - step: [price_fx, price_rates, price_equities]
///   - step: [publish]
/// ```
///
/// The capitalised `Jobs` / `Step` keys written by older flow files are
/// accepted too.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawFlowPlan {
    #[serde(default, alias = "Jobs")]
    pub jobs: Vec<RawStep>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawStep {
    #[serde(default, alias = "Step")]
    pub step: Vec<String>,
}

/// A validated flow plan: steps run strictly in order.
///
/// Construct via `FlowPlan::try_from(RawFlowPlan)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlowPlan {
    steps: Vec<Step>,
}

impl FlowPlan {
    /// Internal constructor used after validation.
    pub(crate) fn new_unchecked(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// A non-empty group of jobs triggered together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    jobs: Vec<String>,
}

impl Step {
    pub(crate) fn new_unchecked(jobs: Vec<String>) -> Self {
        Self { jobs }
    }

    pub fn jobs(&self) -> &[String] {
        &self.jobs
    }
}

/// Settings file, e.g. `~/.airflowrun.yaml`.
///
/// Every key is optional; see [`crate::config::Settings::resolve`] for how
/// they are merged with flags and environment variables.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SettingsFile {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub env: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub uname: Option<String>,
    #[serde(default)]
    pub pass: Option<String>,
    #[serde(default)]
    pub logdir: Option<String>,
    #[serde(default)]
    pub templates_dir: Option<String>,
    #[serde(default)]
    pub on_failure: Option<FailurePolicy>,
    #[serde(default)]
    pub poll_interval_secs: Option<u64>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

/// Fully resolved, immutable configuration for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Settings file the values were read from, if any.
    pub config_path: Option<PathBuf>,
    pub flow_path: PathBuf,
    pub host: String,
    pub env: String,
    pub date: String,
    pub auth: Option<BasicAuth>,
    pub templates_dir: PathBuf,
    pub on_failure: FailurePolicy,
    pub log_dir: PathBuf,
    pub log_to_file: bool,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub dry_run: bool,
}
