//! Layered configuration loader.
//!
//! Layers are read lowest precedence first: system, user, project root, cwd,
//! then any runtime files. Each layer is schema-checked on its own before the
//! stack is merged, so errors point at the file that introduced them.

mod discovery;
mod merge;
mod schema;

#[cfg(test)]
mod tests;

use crate::{AibotConfig, ConfigError};
use log::{debug, info};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};

/// Config filename looked up in the project root and the cwd.
const DEFAULT_CONFIG_FILE: &str = "aibot.json5";
/// Directory under the home directory holding the user layer.
const DEFAULT_CONFIG_DIR: &str = ".aibot";
const DEFAULT_PROJECT_ROOT_MARKERS: &[&str] = &[".git"];

#[cfg(unix)]
const SYSTEM_CONFIG_PATH: &str = "/etc/aibot/aibot.json5";
#[cfg(windows)]
const SYSTEM_CONFIG_PATH: &str = "C:\\ProgramData\\aibot\\aibot.json5";

/// Effective config plus the layers it was built from.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub config: AibotConfig,
    /// Layers that existed on disk, lowest precedence first.
    pub layers: Vec<ConfigLayer>,
}

/// Where a config layer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    System,
    User,
    Project,
    Cwd,
    /// Explicit override files; highest precedence.
    Runtime,
}

impl fmt::Display for ConfigLayerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConfigLayerSource::System => "system",
            ConfigLayerSource::User => "user",
            ConfigLayerSource::Project => "project",
            ConfigLayerSource::Cwd => "cwd",
            ConfigLayerSource::Runtime => "runtime",
        })
    }
}

/// One file in the layer stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayer {
    pub source: ConfigLayerSource,
    pub path: PathBuf,
}

impl ConfigLayer {
    /// `source(path)`, used to prefix validation errors.
    pub fn label(&self) -> String {
        format!("{}({})", self.source, self.path.display())
    }
}

/// Where to look for each layer.
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    pub cwd: PathBuf,
    /// Defaults to `/etc/aibot/aibot.json5` on Unix.
    pub system_config_path: Option<PathBuf>,
    /// Defaults to `~/.aibot/aibot.json5`.
    pub user_config_path: Option<PathBuf>,
    /// Files applied last, in order. Unlike the other layers they must exist.
    pub runtime_paths: Vec<PathBuf>,
    /// Entries whose presence marks the project root.
    pub project_root_markers: Vec<String>,
}

impl LayeredConfigOptions {
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            system_config_path: Some(PathBuf::from(SYSTEM_CONFIG_PATH)),
            user_config_path: discovery::default_user_config_path(),
            runtime_paths: Vec::new(),
            project_root_markers: DEFAULT_PROJECT_ROOT_MARKERS
                .iter()
                .map(|marker| marker.to_string())
                .collect(),
        }
    }

    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }
}

impl AibotConfig {
    /// Load exactly one file, without layering.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("loading config from path: {}", path.display());
        let label = path.display().to_string();
        let value = discovery::parse_file(path, &label)?;
        finish(value, &label)
    }

    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from raw contents (len={})", contents.len());
        let value = json5::from_str(contents).map_err(|source| ConfigError::Parse {
            layer: "config".to_string(),
            source,
        })?;
        finish(value, "config")
    }

    /// Layered load with the default locations for `cwd`.
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredConfig, ConfigError> {
        Self::load_layered_with_options(LayeredConfigOptions::new(cwd))
    }

    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let mut merged = Value::Object(Map::new());
        let mut layers = Vec::new();
        for candidate in discovery::candidates(&options)? {
            if let Some(value) = discovery::read_layer(&candidate)? {
                debug!("merging layer {}", candidate.layer.label());
                merge::overlay(&mut merged, value);
                layers.push(candidate.layer);
            }
        }

        let config = finish(merged, "effective")?;
        info!("layered config loaded (layers={})", layers.len());
        Ok(LayeredConfig { config, layers })
    }

    /// Cross-field checks that the schema pass cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: &str| Err(ConfigError::Invalid(message.to_string()));
        if self.traces.path.trim().is_empty() {
            return invalid("traces.path cannot be empty");
        }
        let filename = self.traces.export_filename.as_str();
        if filename.trim().is_empty() || filename.contains(['/', '\\', '"']) {
            return invalid("traces.export_filename must be a plain file name");
        }
        let remote = &self.traces.remote;
        if remote.enabled && remote.endpoint.as_deref().is_none_or(str::is_empty) {
            return invalid("traces.remote.endpoint is required when remote tracing is enabled");
        }
        let exec = &self.tools.code_execution;
        if exec.enabled && exec.interpreter.trim().is_empty() {
            return invalid("tools.code_execution.interpreter cannot be empty");
        }
        if exec.timeout_secs == 0 {
            return invalid("tools.code_execution.timeout_secs must be positive");
        }
        if self.server.bind.trim().is_empty() {
            return invalid("server.bind cannot be empty");
        }
        Ok(())
    }
}

fn finish(value: Value, label: &str) -> Result<AibotConfig, ConfigError> {
    schema::validate_layer_schema(&value, label)?;
    let config: AibotConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}
