// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// What the flow does after a step in which some run did not succeed.
///
/// - `Continue`: log the failure and carry on with the next step/date
///   (default).
/// - `Abort`: skip every remaining step and date. Sibling jobs of the failing
///   step are still awaited; nothing in flight is cancelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    #[default]
    Continue,
    Abort,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "continue" => Ok(FailurePolicy::Continue),
            "abort" => Ok(FailurePolicy::Abort),
            other => Err(format!(
                "invalid on_failure: {other} (expected \"continue\" or \"abort\")"
            )),
        }
    }
}

/// State of one remote run as seen by this process.
///
/// `Unknown` is never reported by the remote system: it marks a run whose
/// status could not be obtained or decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Queued,
    Running,
    Success,
    Failed,
    Unknown,
}

impl RunState {
    /// Map a state literal from the remote API. Matching is case-sensitive;
    /// anything unrecognised yields `None`.
    pub fn from_remote(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(RunState::Queued),
            "running" => Some(RunState::Running),
            "success" => Some(RunState::Success),
            "failed" => Some(RunState::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, RunState::Queued | RunState::Running)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunState::Queued => "queued",
            RunState::Running => "running",
            RunState::Success => "success",
            RunState::Failed => "failed",
            RunState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
