//! Tests for layered configuration loading.

use super::*;
use crate::{LlmProviderKind, TraceFormat};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_json5(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("dir");
    }
    fs::write(path, contents).expect("write");
}

fn isolated_options(root: &Path, cwd: &Path) -> LayeredConfigOptions {
    let mut options = LayeredConfigOptions::new(cwd);
    options.system_config_path = Some(root.join("system.json5"));
    options.user_config_path = Some(root.join("user.json5"));
    options
}

#[test]
fn empty_config_uses_defaults() {
    let config = AibotConfig::load_from_str("{}").expect("config");
    assert_eq!(config.traces.path, "local_traces.json");
    assert_eq!(config.traces.format, TraceFormat::Json);
    assert!(config.traces.lock);
    assert_eq!(config.traces.export_filename, "local_traces.json");
    assert_eq!(config.traces.remote.project_name, "local_project");
    assert_eq!(config.llm.provider, LlmProviderKind::Azure);
    assert_eq!(config.llm.deployment, "gpt-4o-mini");
    assert_eq!(config.llm.api_version, "2025-01-01-preview");
    assert_eq!(config.tools.file_reader.path, "example.txt");
    assert!(!config.tools.code_execution.enabled);
    assert_eq!(config.server.bind, "127.0.0.1:8501");
}

#[test]
fn parses_full_sections() {
    let json5 = r#"{
        // comments are allowed
        traces: { path: "data/traces.jsonl", format: "jsonl", lock: false },
        llm: { provider: "openai", deployment: "gpt-4o" },
        metadata: { geo_lookup: false },
        tools: { code_execution: { enabled: true, interpreter: "python3", timeout_secs: 3 } },
        server: { bind: "0.0.0.0:9000" },
    }"#;
    let config = AibotConfig::load_from_str(json5).expect("config");
    assert_eq!(config.traces.format, TraceFormat::Jsonl);
    assert!(!config.traces.lock);
    assert_eq!(config.llm.provider, LlmProviderKind::OpenAI);
    assert!(!config.metadata.geo_lookup);
    assert!(config.tools.code_execution.enabled);
    assert_eq!(config.tools.code_execution.timeout_secs, 3);
    assert_eq!(config.server.bind, "0.0.0.0:9000");
}

#[test]
fn rejects_unknown_top_level_key() {
    let err = AibotConfig::load_from_str("{ unexpected: true }").unwrap_err();
    assert!(format!("{err}").contains("unknown key"));
}

#[test]
fn rejects_api_key_in_file() {
    let err = AibotConfig::load_from_str(r#"{ llm: { api_key: "secret" } }"#).unwrap_err();
    assert!(format!("{err}").contains("llm.api_key"));
}

#[test]
fn rejects_unknown_trace_format() {
    let err = AibotConfig::load_from_str(r#"{ traces: { format: "csv" } }"#).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("traces.format"));
    assert!(msg.contains("json, jsonl"));
}

#[test]
fn rejects_remote_without_endpoint() {
    let err =
        AibotConfig::load_from_str(r#"{ traces: { remote: { enabled: true } } }"#).unwrap_err();
    assert!(format!("{err}").contains("traces.remote.endpoint"));
}

#[test]
fn rejects_export_filename_with_separator() {
    let err = AibotConfig::load_from_str(r#"{ traces: { export_filename: "../x.json" } }"#)
        .unwrap_err();
    assert!(format!("{err}").contains("export_filename"));
}

#[test]
fn layered_config_applies_precedence() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let project_root = root.join("project");
    fs::create_dir_all(project_root.join(".git")).expect("git");
    let cwd = project_root.join("subdir");
    fs::create_dir_all(&cwd).expect("cwd");

    write_json5(
        &root.join("system.json5"),
        r#"{ traces: { path: "system.json" }, server: { bind: "10.0.0.1:1" } }"#,
    );
    write_json5(
        &root.join("user.json5"),
        r#"{ traces: { path: "user.json" }, llm: { deployment: "user-model" } }"#,
    );
    write_json5(
        &project_root.join(DEFAULT_CONFIG_FILE),
        r#"{ traces: { path: "project.json" } }"#,
    );
    write_json5(
        &cwd.join(DEFAULT_CONFIG_FILE),
        r#"{ traces: { path: "cwd.json" } }"#,
    );

    let layered =
        AibotConfig::load_layered_with_options(isolated_options(root, &cwd)).expect("layered");
    assert_eq!(layered.config.traces.path, "cwd.json");
    assert_eq!(layered.config.llm.deployment, "user-model");
    assert_eq!(layered.config.server.bind, "10.0.0.1:1");
    let sources: Vec<_> = layered.layers.iter().map(|layer| layer.source).collect();
    assert_eq!(
        sources,
        vec![
            ConfigLayerSource::System,
            ConfigLayerSource::User,
            ConfigLayerSource::Project,
            ConfigLayerSource::Cwd,
        ]
    );
}

#[test]
fn runtime_layer_wins() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let cwd = root.join("work");
    fs::create_dir_all(&cwd).expect("cwd");
    write_json5(&cwd.join(DEFAULT_CONFIG_FILE), r#"{ traces: { lock: true } }"#);
    let runtime = root.join("runtime.json5");
    write_json5(&runtime, r#"{ traces: { lock: false } }"#);

    let options = isolated_options(root, &cwd).with_runtime_path(&runtime);
    let layered = AibotConfig::load_layered_with_options(options).expect("layered");
    assert!(!layered.config.traces.lock);
    assert_eq!(
        layered.layers.last().map(|layer| layer.source),
        Some(ConfigLayerSource::Runtime)
    );
}

#[test]
fn missing_runtime_layer_is_an_error() {
    let temp = TempDir::new().expect("tmp");
    let options =
        isolated_options(temp.path(), temp.path()).with_runtime_path(temp.path().join("nope"));
    let err = AibotConfig::load_layered_with_options(options).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
    assert!(format!("{err}").contains("nope"));
}

#[test]
fn layer_errors_name_the_layer() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    write_json5(&root.join("user.json5"), r#"{ server: { bind: 8080 } }"#);
    let err = AibotConfig::load_layered_with_options(isolated_options(root, root)).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("user("));
    assert!(msg.contains("server.bind"));
}

#[test]
fn syntax_errors_name_the_file() {
    let temp = TempDir::new().expect("tmp");
    let path = temp.path().join("broken.json5");
    write_json5(&path, "{ traces: ");
    let err = AibotConfig::load_from_path(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(format!("{err}").contains("broken.json5"));
}

#[test]
fn same_directory_is_loaded_once() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    fs::create_dir_all(root.join(".git")).expect("git");
    write_json5(&root.join(DEFAULT_CONFIG_FILE), r#"{ server: { bind: "0.0.0.0:1" } }"#);
    let layered =
        AibotConfig::load_layered_with_options(isolated_options(root, root)).expect("layered");
    let sources: Vec<_> = layered.layers.iter().map(|layer| layer.source).collect();
    assert_eq!(sources, vec![ConfigLayerSource::Project]);
    assert_eq!(layered.config.server.bind, "0.0.0.0:1");
}
