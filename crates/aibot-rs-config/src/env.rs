//! Environment overrides for secrets and deployment settings.

use crate::{AibotConfig, LlmProviderKind};
use log::debug;
use std::collections::HashMap;

/// Environment variable names understood by the loader.
pub mod vars {
    pub const AZURE_OPENAI_API_KEY: &str = "AZURE_OPENAI_API_KEY";
    pub const AZURE_OPENAI_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
    pub const AZURE_OPENAI_API_VERSION: &str = "AZURE_OPENAI_API_VERSION";
    pub const GPT_DEPLOYMENT_NAME: &str = "GPT_DEPLOYMENT_NAME";
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const OPENAI_MODEL: &str = "OPENAI_MODEL";
}

/// Source of environment variables.
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads the real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|value| !value.is_empty())
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).filter(|value| !value.is_empty()).cloned()
    }
}

impl AibotConfig {
    /// Apply environment overrides to the LLM section.
    ///
    /// The API key only ever comes from the environment. Endpoint, API version
    /// and deployment from the environment win over config files.
    pub fn apply_env(&mut self, env: &dyn EnvSource) {
        let llm = &mut self.llm;
        match llm.provider {
            LlmProviderKind::Azure => {
                llm.api_key = env.var(vars::AZURE_OPENAI_API_KEY);
                if let Some(endpoint) = env.var(vars::AZURE_OPENAI_ENDPOINT) {
                    llm.endpoint = Some(endpoint);
                }
                if let Some(version) = env.var(vars::AZURE_OPENAI_API_VERSION) {
                    llm.api_version = version;
                }
                if let Some(deployment) = env.var(vars::GPT_DEPLOYMENT_NAME) {
                    llm.deployment = deployment;
                }
            }
            LlmProviderKind::OpenAI => {
                llm.api_key = env.var(vars::OPENAI_API_KEY);
                if let Some(model) = env.var(vars::OPENAI_MODEL) {
                    llm.deployment = model;
                }
            }
        }
        debug!(
            "applied env overrides (provider={:?}, api_key_set={}, endpoint_set={})",
            llm.provider,
            llm.api_key.is_some(),
            llm.endpoint.is_some()
        );
    }
}
