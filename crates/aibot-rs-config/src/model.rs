//! Configuration schema for aibot.

use serde::{Deserialize, Serialize};

/// Root config for the aibot dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AibotConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub traces: TracesConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl AibotConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> AibotConfigBuilder {
        AibotConfigBuilder::new()
    }
}

/// Builder for assembling an `AibotConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct AibotConfigBuilder {
    config: AibotConfig,
}

impl AibotConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: AibotConfig::default(),
        }
    }

    /// Replace the trace log configuration.
    pub fn traces(mut self, traces: TracesConfig) -> Self {
        self.config.traces = traces;
        self
    }

    /// Replace the chat completion configuration.
    pub fn llm(mut self, llm: LlmConfig) -> Self {
        self.config.llm = llm;
        self
    }

    /// Replace the metadata enrichment configuration.
    pub fn metadata(mut self, metadata: MetadataConfig) -> Self {
        self.config.metadata = metadata;
        self
    }

    /// Replace the built-in tool configuration.
    pub fn tools(mut self, tools: ToolsConfig) -> Self {
        self.config.tools = tools;
        self
    }

    /// Replace the HTTP server configuration.
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.config.server = server;
        self
    }

    /// Finalize and return the built `AibotConfig`.
    pub fn build(self) -> AibotConfig {
        self.config
    }
}

/// Backing file layout for the trace log.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TraceFormat {
    /// Single JSON array rewritten atomically on every append.
    #[default]
    Json,
    /// One JSON record per line, appended in place.
    Jsonl,
}

/// Trace log persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracesConfig {
    #[serde(default = "default_traces_path")]
    pub path: String,
    #[serde(default)]
    pub format: TraceFormat,
    /// Hold an advisory file lock across each read-modify-write.
    #[serde(default = "default_true")]
    pub lock: bool,
    #[serde(default = "default_traces_path")]
    pub export_filename: String,
    #[serde(default)]
    pub remote: RemoteTracingConfig,
}

impl Default for TracesConfig {
    fn default() -> Self {
        Self {
            path: default_traces_path(),
            format: TraceFormat::default(),
            lock: true,
            export_filename: default_traces_path(),
            remote: RemoteTracingConfig::default(),
        }
    }
}

/// Default trace file name, also used as the download name.
fn default_traces_path() -> String {
    "local_traces.json".to_string()
}

fn default_true() -> bool {
    true
}

/// Remote tracing service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteTracingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_project_name")]
    pub project_name: String,
    /// Environment variable holding the bearer token, if any.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "default_remote_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for RemoteTracingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            project_name: default_project_name(),
            api_key_env: None,
            timeout_ms: default_remote_timeout_ms(),
        }
    }
}

fn default_project_name() -> String {
    "local_project".to_string()
}

fn default_remote_timeout_ms() -> u64 {
    5_000
}

/// Chat completion backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    /// Azure OpenAI deployment endpoint.
    #[default]
    Azure,
    /// OpenAI public API.
    #[serde(rename = "openai")]
    OpenAI,
}

/// Chat completion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProviderKind,
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Azure deployment name, or the model name for OpenAI.
    #[serde(default = "default_deployment")]
    pub deployment: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Filled from the environment; never read from config files.
    #[serde(skip)]
    pub api_key: Option<String>,
    #[serde(default = "default_llm_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::default(),
            endpoint: None,
            deployment: default_deployment(),
            api_version: default_api_version(),
            api_key: None,
            timeout_ms: default_llm_timeout_ms(),
        }
    }
}

fn default_deployment() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_version() -> String {
    "2025-01-01-preview".to_string()
}

fn default_llm_timeout_ms() -> u64 {
    60_000
}

/// Request metadata enrichment settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    #[serde(default = "default_true")]
    pub user_agent: bool,
    #[serde(default = "default_true")]
    pub geo_lookup: bool,
    #[serde(default = "default_geo_endpoint")]
    pub geo_endpoint: String,
    #[serde(default = "default_geo_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            user_agent: true,
            geo_lookup: true,
            geo_endpoint: default_geo_endpoint(),
            timeout_ms: default_geo_timeout_ms(),
        }
    }
}

fn default_geo_endpoint() -> String {
    "https://ipinfo.io".to_string()
}

fn default_geo_timeout_ms() -> u64 {
    3_000
}

/// Built-in tool settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ToolsConfig {
    /// Root for relative tool paths; defaults to the working directory.
    #[serde(default)]
    pub workspace_root: Option<String>,
    #[serde(default)]
    pub calculator: CalculatorConfig,
    #[serde(default)]
    pub file_reader: FileReaderConfig,
    #[serde(default)]
    pub code_execution: CodeExecutionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculatorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReaderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Workspace-relative file served by "read file" prompts.
    #[serde(default = "default_reader_path")]
    pub path: String,
    #[serde(default = "default_max_read_bytes")]
    pub max_bytes: usize,
}

impl Default for FileReaderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_reader_path(),
            max_bytes: default_max_read_bytes(),
        }
    }
}

fn default_reader_path() -> String {
    "example.txt".to_string()
}

fn default_max_read_bytes() -> usize {
    200_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeExecutionConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Interpreter command line; the snippet is passed on stdin.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    #[serde(default = "default_exec_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
}

impl Default for CodeExecutionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interpreter: default_interpreter(),
            timeout_secs: default_exec_timeout_secs(),
            max_output_bytes: default_max_output_bytes(),
        }
    }
}

fn default_interpreter() -> String {
    "python3".to_string()
}

fn default_exec_timeout_secs() -> u64 {
    10
}

fn default_max_output_bytes() -> usize {
    32 * 1024
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8501".to_string()
}
