// src/flow/mod.rs

//! Flow execution.
//!
//! - [`step`] classifies a plan step as serial or parallel.
//! - [`executor`] walks dates × steps and drives one [`RunTracker`] per job.
//! - [`report`] collects the terminal result of every run.
//! - [`preview`] renders the schedule for `--dry-run`.
//!
//! [`RunTracker`]: crate::remote::RunTracker

pub mod executor;
pub mod preview;
pub mod report;
pub mod step;

pub use executor::{FlowExecutor, FlowStopped};
pub use preview::{PlannedJob, preview};
pub use report::{FlowReport, JobOutcome};
pub use step::StepKind;
