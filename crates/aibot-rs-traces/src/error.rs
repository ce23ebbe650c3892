use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by trace stores and exporters.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("trace file io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize trace records: {0}")]
    Serialize(#[from] serde_json::Error),
    /// The backing file exists but does not hold a valid record sequence.
    #[error("trace file {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    #[error("failed to lock trace file {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid trace file path: {0}")]
    InvalidPath(PathBuf),
    /// Remote tracing service rejected or never received the trace.
    #[error("remote trace export failed: {0}")]
    Remote(String),
}

impl TraceError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> TraceError {
        let path = path.into();
        move |source| TraceError::Io { path, source }
    }
}
