//! Workspace file reader tool.

use crate::builtins::utils::{parse_args, relative_display, resolve_workspace_path, schema_value};
use crate::{Tool, ToolContext};
use aibot_rs_protocol::ToolError;
use async_trait::async_trait;
use autoagents_core::tool::ToolInputT;
use autoagents_derive::ToolInput;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fs;

#[derive(Debug, Serialize, Deserialize, ToolInput)]
struct FileReaderArgs {
    #[input(description = "Workspace-relative path. Defaults to the configured file.")]
    #[serde(default)]
    path: Option<String>,
    #[input(description = "Maximum number of bytes to read.")]
    #[serde(default)]
    max_bytes: Option<usize>,
}

/// Reads a text file from the workspace.
#[derive(Debug, Clone)]
pub struct FileReaderTool {
    default_path: String,
}

impl FileReaderTool {
    pub fn new(default_path: impl Into<String>) -> Self {
        Self {
            default_path: default_path.into(),
        }
    }
}

#[async_trait]
impl Tool for FileReaderTool {
    fn name(&self) -> &str {
        "FileReader"
    }

    fn description(&self) -> &str {
        "Read a text file from the workspace"
    }

    fn args_schema(&self) -> Value {
        schema_value(FileReaderArgs::io_schema())
    }

    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<Value, ToolError> {
        let input: FileReaderArgs = parse_args(args)?;
        let requested = input.path.as_deref().unwrap_or(&self.default_path);
        let path = resolve_workspace_path(ctx, requested)?;

        let metadata = fs::metadata(&path).map_err(|err| {
            ToolError::ExecutionFailed(format!("failed to read metadata for {requested}: {err}"))
        })?;
        if metadata.is_dir() {
            return Err(ToolError::ExecutionFailed(
                "path is a directory".to_string(),
            ));
        }

        let bytes = fs::read(&path)
            .map_err(|err| ToolError::ExecutionFailed(format!("failed to read {requested}: {err}")))?;
        let max_bytes = input.max_bytes.unwrap_or(ctx.max_read_bytes);
        let truncated = bytes.len() > max_bytes;
        let slice = if truncated { &bytes[..max_bytes] } else { &bytes };
        let content = String::from_utf8_lossy(slice).to_string();
        info!(
            "read file (bytes_read={}, truncated={})",
            slice.len(),
            truncated
        );

        Ok(json!({
            "path": relative_display(&ctx.workspace_root, &path),
            "content": content,
            "truncated": truncated,
            "bytes_read": slice.len(),
        }))
    }
}
