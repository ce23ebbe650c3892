//! Utility helpers shared by built-in tools.

use crate::ToolContext;
use aibot_rs_protocol::ToolError;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Parse JSON args into a typed struct for tool calls.
pub(super) fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|err| ToolError::InvalidArguments(err.to_string()))
}

/// Decode a derived `io_schema` string, falling back to an open object schema.
pub(super) fn schema_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| json!({ "type": "object" }))
}

/// Resolve a workspace-relative path to an existing file inside the root.
pub(super) fn resolve_workspace_path(ctx: &ToolContext, input: &str) -> Result<PathBuf, ToolError> {
    if input.trim().is_empty() {
        return Err(ToolError::InvalidArguments(
            "path cannot be empty".to_string(),
        ));
    }
    let root = &ctx.workspace_root;
    let resolved = normalize_relative_path(root, input)?;
    ensure_within_root(root, &resolved)?;
    Ok(resolved)
}

/// Format a path relative to a root for display.
pub(super) fn relative_display(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string()
}

/// Keep at most `max` bytes, cutting on a char boundary.
pub(super) fn truncate_utf8(text: &mut String, max: usize) -> bool {
    if text.len() <= max {
        return false;
    }
    let mut cut = max;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
    true
}

fn normalize_relative_path(root: &Path, input: &str) -> Result<PathBuf, ToolError> {
    let path = Path::new(input);
    if path.is_absolute() {
        return Err(ToolError::InvalidArguments(
            "path must be relative to workspace root".to_string(),
        ));
    }

    let mut parts: Vec<OsString> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_os_string()),
            Component::CurDir => (),
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return Err(ToolError::PermissionDenied(
                        "path escapes workspace root".to_string(),
                    ));
                }
            }
            Component::Prefix(_) | Component::RootDir => {
                return Err(ToolError::InvalidArguments(
                    "path must be relative to workspace root".to_string(),
                ));
            }
        }
    }

    let mut resolved = root.to_path_buf();
    resolved.extend(parts);
    Ok(resolved)
}

/// Symlinks may still point outside; compare canonical forms.
fn ensure_within_root(root: &Path, path: &Path) -> Result<(), ToolError> {
    let root = root.canonicalize().map_err(|err| {
        ToolError::ExecutionFailed(format!("failed to resolve workspace root: {err}"))
    })?;
    let target = path.canonicalize().map_err(|err| {
        ToolError::ExecutionFailed(format!("failed to resolve path {}: {err}", path.display()))
    })?;
    if !target.starts_with(&root) {
        return Err(ToolError::PermissionDenied(
            "path is outside workspace root".to_string(),
        ));
    }
    Ok(())
}
