//! Error types for config loading and validation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned while loading or validating config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// JSON5 syntax error in the named layer.
    #[error("cannot parse {layer}: {source}")]
    Parse {
        layer: String,
        #[source]
        source: json5::Error,
    },
    #[error("config does not match the expected shape: {0}")]
    Decode(#[from] serde_json::Error),
    /// A key failed schema validation; `path` is `layer:dotted.key`.
    #[error("invalid config at {path}: {message}")]
    InvalidField { path: String, message: String },
    #[error("invalid config: {0}")]
    Invalid(String),
}
