//! Execution context handed to every tool call.

use aibot_rs_config::ToolsConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Limits applied to code execution.
#[derive(Debug, Clone)]
pub struct ExecLimits {
    /// Interpreter command line, split with shell quoting rules.
    pub interpreter: String,
    pub timeout: Duration,
    /// Maximum bytes kept from each of stdout and stderr.
    pub max_output_bytes: usize,
}

/// Shared context passed to tools during execution.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Root that relative tool paths resolve against and may not escape.
    pub workspace_root: PathBuf,
    /// Maximum bytes returned by file reads.
    pub max_read_bytes: usize,
    pub exec: ExecLimits,
}

impl ToolContext {
    /// Build a context from tool settings, resolving the workspace root
    /// against `cwd` when it is relative or unset.
    pub fn from_config(config: &ToolsConfig, cwd: &Path) -> Self {
        let workspace_root = match config.workspace_root.as_deref() {
            Some(root) => cwd.join(root),
            None => cwd.to_path_buf(),
        };
        let exec = &config.code_execution;
        Self {
            workspace_root,
            max_read_bytes: config.file_reader.max_bytes,
            exec: ExecLimits {
                interpreter: exec.interpreter.clone(),
                timeout: Duration::from_secs(exec.timeout_secs),
                max_output_bytes: exec.max_output_bytes,
            },
        }
    }

    /// Context rooted at `root` with default limits.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        let mut ctx = Self::from_config(&ToolsConfig::default(), Path::new(""));
        ctx.workspace_root = root.into();
        ctx
    }
}
