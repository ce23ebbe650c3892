use aibot_rs_config::{AibotConfig, EnvSource};
use aibot_rs_core::{DashboardRow, MetadataCollector, TurnRunner, build_llm_provider};
use aibot_rs_tools::{ToolContext, ToolRegistry, register_builtin_tools};
use aibot_rs_traces::{exporter_from_config, open_trace_store};
use anyhow::Context;
use log::info;
use std::path::Path;

/// Load `path`, or the layered config for `cwd`, then apply env overrides.
pub fn load_config(
    path: Option<&Path>,
    cwd: &Path,
    env: &dyn EnvSource,
) -> anyhow::Result<AibotConfig> {
    let mut config = if let Some(path) = path {
        AibotConfig::load_from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?
    } else {
        info!("loading layered config from cwd: {}", cwd.display());
        let layered = AibotConfig::load_layered(cwd).context("failed to load layered config")?;
        layered.config
    };
    config.apply_env(env);
    Ok(config)
}

/// Build a turn runner with the configured store, model, tools, metadata
/// enrichment and remote exporter.
pub fn build_runner(
    config: &AibotConfig,
    cwd: &Path,
    env: &dyn EnvSource,
) -> anyhow::Result<TurnRunner> {
    let store = open_trace_store(&config.traces).context("failed to open trace store")?;
    let llm = build_llm_provider(&config.llm).context("failed to build LLM provider")?;
    let tools = ToolRegistry::new();
    register_builtin_tools(&tools, &config.tools);
    let metadata = MetadataCollector::from_config(&config.metadata)
        .context("failed to build metadata collector")?;
    let exporter = exporter_from_config(&config.traces.remote, env)
        .context("failed to build remote trace exporter")?;
    Ok(TurnRunner::builder(llm, store)
        .tools(tools, ToolContext::from_config(&config.tools, cwd))
        .metadata(metadata)
        .exporter(exporter)
        .build())
}

/// Dashboard rows as text: a label line, then the content, per record.
pub fn render_rows(rows: &[DashboardRow]) -> String {
    let mut out = String::new();
    for row in rows {
        out.push_str(&row.label());
        out.push('\n');
        out.push_str(row.content.as_deref().unwrap_or_default());
        out.push_str("\n\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::render_rows;
    use aibot_rs_core::DashboardRow;
    use aibot_rs_protocol::{Metadata, Role};
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_label_then_content() {
        let rows = vec![DashboardRow {
            time: "2023-11-14 22:13:20".to_string(),
            role: Role::User,
            trace_id: "abcd1234".to_string(),
            content: Some("What is 2+2?".to_string()),
            metadata: Metadata::new(),
        }];
        assert_eq!(
            render_rows(&rows),
            "2023-11-14 22:13:20 | user | Trace ID: abcd1234\nWhat is 2+2?\n\n"
        );
    }

    #[test]
    fn null_content_renders_empty() {
        let rows = vec![DashboardRow {
            time: "unknown".to_string(),
            role: Role::Assistant,
            trace_id: "t".to_string(),
            content: None,
            metadata: Metadata::new(),
        }];
        assert_eq!(render_rows(&rows), "unknown | assistant | Trace ID: t\n\n\n");
    }
}
