//! Schema validation helpers for aibot JSON5 configuration.

use crate::ConfigError;
use serde_json::{Map, Value};

/// Check one layer's keys and value types. `layer` prefixes every error path.
pub(super) fn validate_layer_schema(value: &Value, layer: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, "")?;
    let allowed = ["$schema", "traces", "llm", "metadata", "tools", "server"];
    ensure_allowed_keys(map, &allowed, layer, "")?;

    if let Some(value) = map.get("$schema") {
        expect_string(value, layer, "$schema")?;
    }
    if let Some(value) = map.get("traces") {
        validate_traces(value, layer, "traces")?;
    }
    if let Some(value) = map.get("llm") {
        validate_llm(value, layer, "llm")?;
    }
    if let Some(value) = map.get("metadata") {
        validate_metadata(value, layer, "metadata")?;
    }
    if let Some(value) = map.get("tools") {
        validate_tools(value, layer, "tools")?;
    }
    if let Some(value) = map.get("server") {
        validate_server(value, layer, "server")?;
    }

    Ok(())
}

/// Validate the "traces" block.
fn validate_traces(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &["path", "format", "lock", "export_filename", "remote"],
        layer,
        path,
    )?;

    if let Some(value) = map.get("path") {
        expect_string(value, layer, &join_path(path, "path"))?;
    }
    if let Some(value) = map.get("format") {
        expect_one_of(value, &["json", "jsonl"], layer, &join_path(path, "format"))?;
    }
    if let Some(value) = map.get("lock") {
        expect_bool(value, layer, &join_path(path, "lock"))?;
    }
    if let Some(value) = map.get("export_filename") {
        expect_string(value, layer, &join_path(path, "export_filename"))?;
    }
    if let Some(value) = map.get("remote") {
        validate_remote(value, layer, &join_path(path, "remote"))?;
    }
    Ok(())
}

/// Validate the remote trace exporter block.
fn validate_remote(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &[
            "enabled",
            "endpoint",
            "project_name",
            "api_key_env",
            "timeout_ms",
        ],
        layer,
        path,
    )?;

    if let Some(value) = map.get("enabled") {
        expect_bool(value, layer, &join_path(path, "enabled"))?;
    }
    if let Some(value) = map.get("endpoint") {
        expect_string(value, layer, &join_path(path, "endpoint"))?;
    }
    if let Some(value) = map.get("project_name") {
        expect_string(value, layer, &join_path(path, "project_name"))?;
    }
    if let Some(value) = map.get("api_key_env") {
        expect_string(value, layer, &join_path(path, "api_key_env"))?;
    }
    if let Some(value) = map.get("timeout_ms") {
        expect_u64(value, layer, &join_path(path, "timeout_ms"))?;
    }
    Ok(())
}

/// Validate the "llm" block. API keys are only read from the environment.
fn validate_llm(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &[
            "provider",
            "endpoint",
            "deployment",
            "api_version",
            "timeout_ms",
        ],
        layer,
        path,
    )?;

    if let Some(value) = map.get("provider") {
        expect_one_of(value, &["azure", "openai"], layer, &join_path(path, "provider"))?;
    }
    if let Some(value) = map.get("endpoint") {
        expect_string(value, layer, &join_path(path, "endpoint"))?;
    }
    if let Some(value) = map.get("deployment") {
        expect_string(value, layer, &join_path(path, "deployment"))?;
    }
    if let Some(value) = map.get("api_version") {
        expect_string(value, layer, &join_path(path, "api_version"))?;
    }
    if let Some(value) = map.get("timeout_ms") {
        expect_u64(value, layer, &join_path(path, "timeout_ms"))?;
    }
    Ok(())
}

/// Validate the "metadata" block.
fn validate_metadata(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &["user_agent", "geo_lookup", "geo_endpoint", "timeout_ms"],
        layer,
        path,
    )?;

    if let Some(value) = map.get("user_agent") {
        expect_bool(value, layer, &join_path(path, "user_agent"))?;
    }
    if let Some(value) = map.get("geo_lookup") {
        expect_bool(value, layer, &join_path(path, "geo_lookup"))?;
    }
    if let Some(value) = map.get("geo_endpoint") {
        expect_string(value, layer, &join_path(path, "geo_endpoint"))?;
    }
    if let Some(value) = map.get("timeout_ms") {
        expect_u64(value, layer, &join_path(path, "timeout_ms"))?;
    }
    Ok(())
}

/// Validate the "tools" block.
fn validate_tools(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &["workspace_root", "calculator", "file_reader", "code_execution"],
        layer,
        path,
    )?;

    if let Some(value) = map.get("workspace_root") {
        expect_string(value, layer, &join_path(path, "workspace_root"))?;
    }
    if let Some(value) = map.get("calculator") {
        let calc_path = join_path(path, "calculator");
        let calc = expect_object(value, layer, &calc_path)?;
        ensure_allowed_keys(calc, &["enabled"], layer, &calc_path)?;
        if let Some(value) = calc.get("enabled") {
            expect_bool(value, layer, &join_path(&calc_path, "enabled"))?;
        }
    }
    if let Some(value) = map.get("file_reader") {
        validate_file_reader(value, layer, &join_path(path, "file_reader"))?;
    }
    if let Some(value) = map.get("code_execution") {
        validate_code_execution(value, layer, &join_path(path, "code_execution"))?;
    }
    Ok(())
}

fn validate_file_reader(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["enabled", "path", "max_bytes"], layer, path)?;

    if let Some(value) = map.get("enabled") {
        expect_bool(value, layer, &join_path(path, "enabled"))?;
    }
    if let Some(value) = map.get("path") {
        expect_string(value, layer, &join_path(path, "path"))?;
    }
    if let Some(value) = map.get("max_bytes") {
        expect_u64(value, layer, &join_path(path, "max_bytes"))?;
    }
    Ok(())
}

fn validate_code_execution(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &["enabled", "interpreter", "timeout_secs", "max_output_bytes"],
        layer,
        path,
    )?;

    if let Some(value) = map.get("enabled") {
        expect_bool(value, layer, &join_path(path, "enabled"))?;
    }
    if let Some(value) = map.get("interpreter") {
        expect_string(value, layer, &join_path(path, "interpreter"))?;
    }
    if let Some(value) = map.get("timeout_secs") {
        expect_u64(value, layer, &join_path(path, "timeout_secs"))?;
    }
    if let Some(value) = map.get("max_output_bytes") {
        expect_u64(value, layer, &join_path(path, "max_output_bytes"))?;
    }
    Ok(())
}

/// Validate the "server" block.
fn validate_server(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["bind"], layer, path)?;
    if let Some(value) = map.get("bind") {
        expect_string(value, layer, &join_path(path, "bind"))?;
    }
    Ok(())
}

/// Expect a JSON object or return a typed error.
fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(invalid_field(layer, path, "expected object")),
    }
}

/// Expect a JSON string or return a typed error.
fn expect_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.as_str().is_some() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected string"))
    }
}

/// Expect a string drawn from a fixed set of variants.
fn expect_one_of(
    value: &Value,
    variants: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    match value.as_str() {
        Some(raw) if variants.contains(&raw) => Ok(()),
        Some(_) => Err(invalid_field(
            layer,
            path,
            &format!("expected one of {}", variants.join(", ")),
        )),
        None => Err(invalid_field(layer, path, "expected string")),
    }
}

/// Expect a JSON boolean or return a typed error.
fn expect_bool(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if matches!(value, Value::Bool(_)) {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected bool"))
    }
}

/// Expect a non-negative JSON integer or return a typed error.
fn expect_u64(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_u64() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected non-negative integer"))
    }
}

/// Ensure an object contains only allowed keys.
fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    for key in map.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(invalid_field(layer, &join_path(path, key), "unknown key"));
        }
    }
    Ok(())
}

/// Join nested paths for better error messages.
fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Build a structured invalid-field error.
fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    let normalized_path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{layer}:{normalized_path}"),
        message: message.to_string(),
    }
}
