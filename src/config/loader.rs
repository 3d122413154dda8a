// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::model::{FlowPlan, RawFlowPlan, SettingsFile};
use crate::errors::{Result, RunnerError};

/// Serialisation formats accepted for flow and settings files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Yaml,
    Toml,
    Json,
}

impl FileFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(FileFormat::Yaml),
            Some("toml") => Ok(FileFormat::Toml),
            Some("json") => Ok(FileFormat::Json),
            _ => Err(RunnerError::ConfigError(format!(
                "unsupported file type for {}: expected .yaml, .yml, .toml or .json",
                path.display()
            ))),
        }
    }
}

/// Deserialize `contents` in the given format.
pub fn parse_str<T: DeserializeOwned>(contents: &str, format: FileFormat) -> Result<T> {
    let value = match format {
        FileFormat::Yaml => serde_yaml::from_str(contents)?,
        FileFormat::Toml => toml::from_str(contents)?,
        FileFormat::Json => serde_json::from_str(contents)
            .map_err(|e| RunnerError::ConfigError(format!("invalid JSON: {e}")))?,
    };
    Ok(value)
}

fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = FileFormat::from_path(path)?;
    let contents = fs::read_to_string(path)?;
    parse_str(&contents, format)
}

/// Load a flow file without semantic validation.
pub fn load_flow_from_path(path: impl AsRef<Path>) -> Result<RawFlowPlan> {
    load_file(path.as_ref())
}

/// Load and validate a flow file.
///
/// This is the entry point the rest of the application uses: any problem
/// with the plan surfaces here, before a single job is triggered.
pub fn load_flow(path: impl AsRef<Path>) -> Result<FlowPlan> {
    let path = path.as_ref();
    let raw = load_flow_from_path(path)?;
    let plan = FlowPlan::try_from(raw)?;
    info!(flow = %path.display(), steps = plan.steps().len(), "using flow file");
    Ok(plan)
}

/// Pick the settings file to use.
///
/// An explicitly requested path is always returned (and must exist when
/// loaded). The implicit default `~/.airflowrun.yaml` is only returned when
/// it exists.
pub fn settings_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => default_settings_path().filter(|p| p.is_file()),
    }
}

/// Load a settings file, or return empty settings when there is none.
pub fn load_settings_file(path: Option<&Path>) -> Result<SettingsFile> {
    match path {
        Some(path) => load_file(path),
        None => {
            debug!("no settings file; using flags, environment and defaults");
            Ok(SettingsFile::default())
        }
    }
}

/// `$HOME/.airflowrun.yaml`, if a home directory can be determined.
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".airflowrun.yaml"))
}
