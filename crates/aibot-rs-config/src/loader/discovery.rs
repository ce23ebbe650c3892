//! Finding and reading layer files.

use super::{ConfigLayer, ConfigLayerSource, DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILE};
use super::{LayeredConfigOptions, schema};
use crate::ConfigError;
use directories::UserDirs;
use log::debug;
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub(super) struct Candidate {
    pub(super) layer: ConfigLayer,
    /// Runtime layers must exist; the rest are skipped when absent.
    pub(super) required: bool,
}

/// Every layer location in precedence order. A directory reached twice (cwd
/// equal to the project root) contributes one layer.
pub(super) fn candidates(options: &LayeredConfigOptions) -> Result<Vec<Candidate>, ConfigError> {
    let cwd = canonical(&options.cwd)?;
    let mut optional = Vec::new();
    if let Some(path) = &options.system_config_path {
        optional.push((ConfigLayerSource::System, path.clone()));
    }
    if let Some(path) = &options.user_config_path {
        optional.push((ConfigLayerSource::User, path.clone()));
    }
    if let Some(root) = project_root(&cwd, &options.project_root_markers) {
        optional.push((ConfigLayerSource::Project, root.join(DEFAULT_CONFIG_FILE)));
    }
    optional.push((ConfigLayerSource::Cwd, cwd.join(DEFAULT_CONFIG_FILE)));

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for (source, path) in optional {
        let key = path.canonicalize().unwrap_or_else(|_| path.clone());
        if !seen.insert(key) {
            debug!("skipping repeated layer (source={source}, path={})", path.display());
            continue;
        }
        out.push(Candidate {
            layer: ConfigLayer { source, path },
            required: false,
        });
    }
    out.extend(options.runtime_paths.iter().map(|path| Candidate {
        layer: ConfigLayer {
            source: ConfigLayerSource::Runtime,
            path: path.clone(),
        },
        required: true,
    }));
    Ok(out)
}

/// Parse and schema-check one layer; `None` for an absent optional layer.
pub(super) fn read_layer(candidate: &Candidate) -> Result<Option<Value>, ConfigError> {
    let path = &candidate.layer.path;
    if !candidate.required && !path.exists() {
        debug!("no {} layer at {}", candidate.layer.source, path.display());
        return Ok(None);
    }
    let label = candidate.layer.label();
    let value = parse_file(path, &label)?;
    schema::validate_layer_schema(&value, &label)?;
    Ok(Some(value))
}

pub(super) fn parse_file(path: &Path, label: &str) -> Result<Value, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    json5::from_str(&contents).map_err(|source| ConfigError::Parse {
        layer: label.to_string(),
        source,
    })
}

pub(super) fn default_user_config_path() -> Option<PathBuf> {
    UserDirs::new().map(|dirs| {
        dirs.home_dir()
            .join(DEFAULT_CONFIG_DIR)
            .join(DEFAULT_CONFIG_FILE)
    })
}

/// Canonical form of `path`; a path that does not exist yet is kept as given.
fn canonical(path: &Path) -> Result<PathBuf, ConfigError> {
    match path.canonicalize() {
        Ok(path) => Ok(path),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(path.to_path_buf()),
        Err(source) => Err(ConfigError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn project_root(cwd: &Path, markers: &[String]) -> Option<PathBuf> {
    cwd.ancestors()
        .find(|dir| markers.iter().any(|marker| dir.join(marker).exists()))
        .map(Path::to_path_buf)
}
