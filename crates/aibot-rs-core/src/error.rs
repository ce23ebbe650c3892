//! Error types for the chat loop.

use aibot_rs_traces::TraceError;
use thiserror::Error;

/// Errors returned by turn processing and provider setup.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Session id is unknown to the caller's session table.
    #[error("unknown session: {0}")]
    UnknownSession(String),
    /// The turn could not be written to the trace log.
    #[error("failed to persist turn: {0}")]
    Persistence(#[from] TraceError),
    /// Provider configuration is incomplete or invalid.
    #[error("config error: {0}")]
    Config(String),
    /// Background task failed before completing.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Failures while enriching request metadata. Never surfaced to users.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("http error: {0}")]
    Http(String),
    #[error("lookup service responded with {0}")]
    Status(u16),
    #[error("invalid lookup response: {0}")]
    Decode(String),
}
