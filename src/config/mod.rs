// src/config/mod.rs

//! Configuration loading and validation for airflow-runner.
//!
//! Responsibilities:
//! - Define the flow plan and settings data model (`model.rs`).
//! - Load flow and settings files from disk (`loader.rs`).
//! - Validate flow plans (`validate.rs`).
//! - Merge flags, environment and settings file (`settings.rs`).

pub mod loader;
pub mod model;
pub mod settings;
pub mod validate;

pub use loader::{FileFormat, load_flow, load_flow_from_path, load_settings_file, settings_path};
pub use model::{FlowPlan, RawFlowPlan, RawStep, Settings, SettingsFile, Step};
