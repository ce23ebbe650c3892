//! Opt-in tool that runs a code snippet through an interpreter.

use crate::builtins::utils::{parse_args, schema_value, truncate_utf8};
use crate::{Tool, ToolContext};
use aibot_rs_protocol::ToolError;
use async_trait::async_trait;
use autoagents_core::tool::ToolInputT;
use autoagents_derive::ToolInput;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Debug, Serialize, Deserialize, ToolInput)]
#[serde(deny_unknown_fields)]
struct CodeExecArgs {
    #[input(description = "Source code passed to the interpreter on stdin.")]
    code: String,
}

/// Runs code with the configured interpreter in the workspace root.
#[derive(Debug, Default)]
pub struct CodeExecTool;

#[async_trait]
impl Tool for CodeExecTool {
    fn name(&self) -> &str {
        "CodeExec"
    }

    fn description(&self) -> &str {
        "Execute a code snippet and return its output"
    }

    fn args_schema(&self) -> Value {
        schema_value(CodeExecArgs::io_schema())
    }

    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<Value, ToolError> {
        let input: CodeExecArgs = parse_args(args)?;
        if input.code.trim().is_empty() {
            return Err(ToolError::InvalidArguments("code cannot be empty".to_string()));
        }
        let (program, program_args) = parse_command_line(&ctx.exec.interpreter)?;
        info!(
            "executing snippet (interpreter={}, code_len={})",
            program,
            input.code.len()
        );

        let mut child = Command::new(&program)
            .args(&program_args)
            .current_dir(&ctx.workspace_root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| ToolError::ExecutionFailed(format!("failed to start {program}: {err}")))?;

        let stdin = child.stdin.take();
        let run = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(input.code.as_bytes()).await.map_err(|err| {
                    ToolError::ExecutionFailed(format!("failed to send code: {err}"))
                })?;
            }
            child
                .wait_with_output()
                .await
                .map_err(|err| ToolError::ExecutionFailed(err.to_string()))
        };
        let output = tokio::time::timeout(ctx.exec.timeout, run)
            .await
            .map_err(|_| ToolError::Timeout(ctx.exec.timeout.as_secs()))??;

        let mut stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let mut stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let truncated = truncate_utf8(&mut stdout, ctx.exec.max_output_bytes)
            | truncate_utf8(&mut stderr, ctx.exec.max_output_bytes);
        let status_code = output.status.code();
        if status_code != Some(0) {
            warn!("snippet finished with non-zero status (status={status_code:?})");
        }

        Ok(json!({
            "status_code": status_code,
            "stdout": stdout,
            "stderr": stderr,
            "truncated": truncated,
        }))
    }
}

fn parse_command_line(command: &str) -> Result<(String, Vec<String>), ToolError> {
    let tokens =
        shell_words::split(command).map_err(|err| ToolError::InvalidArguments(err.to_string()))?;
    let mut iter = tokens.into_iter();
    let Some(program) = iter.next() else {
        return Err(ToolError::InvalidArguments(
            "interpreter cannot be empty".to_string(),
        ));
    };
    Ok((program, iter.collect()))
}

/// Body of the first fenced code block (```` ``` ````) in `text`.
pub fn extract_code_block(text: &str) -> Option<String> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];
    let end = body.find("```")?;
    let code = body[..end].trim_end();
    if code.trim().is_empty() {
        None
    } else {
        Some(code.to_string())
    }
}
