/// Why a tool call produced no output. Rendered into the reply as
/// `"<Tool> Error: <message>"`.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("tool not found: {0}")]
    ToolNotFound(String),
    /// Arguments did not match the tool's schema, or no usable input was found.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
    /// Disabled tool, or a path outside the workspace.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// Seconds allowed before the call was abandoned.
    #[error("timed out after {0}s")]
    Timeout(u64),
}
