//! Chat completion providers.
//!
//! Both Azure OpenAI deployments and the public OpenAI API go through the
//! `autoagents-llm` backends.

use crate::CoreError;
use aibot_rs_config::{LlmConfig, LlmProviderKind, vars};
use autoagents_llm::LLMProvider;
use autoagents_llm::backends::azure_openai::AzureOpenAI;
use autoagents_llm::backends::openai::OpenAI;
use autoagents_llm::builder::LLMBuilder;
use log::info;
use std::sync::Arc;

/// Build the provider selected by `llm.provider`.
///
/// Credentials come from [`LlmConfig::api_key`], which is only ever filled
/// from the environment.
pub fn build_llm_provider(config: &LlmConfig) -> Result<Arc<dyn LLMProvider>, CoreError> {
    let timeout_secs = config.timeout_ms.div_ceil(1000).max(1);
    match config.provider {
        LlmProviderKind::Azure => {
            let endpoint = config.endpoint.as_deref().ok_or_else(|| {
                CoreError::Config(format!("{} is not set", vars::AZURE_OPENAI_ENDPOINT))
            })?;
            let api_key = config.api_key.clone().ok_or_else(|| {
                CoreError::Config(format!("{} is not set", vars::AZURE_OPENAI_API_KEY))
            })?;
            let endpoint = endpoint.trim_end_matches('/').to_string();
            info!(
                "building Azure OpenAI LLM provider (endpoint={}, deployment={}, api_version={})",
                endpoint, config.deployment, config.api_version
            );
            let llm: Arc<dyn LLMProvider> = LLMBuilder::<AzureOpenAI>::new()
                .api_key(api_key)
                .base_url(endpoint)
                .deployment_id(config.deployment.clone())
                .api_version(config.api_version.clone())
                .model(config.deployment.clone())
                .timeout_seconds(timeout_secs)
                .build()
                .map_err(|err| CoreError::Config(err.to_string()))?;
            Ok(llm)
        }
        LlmProviderKind::OpenAI => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                CoreError::Config(format!("{} is not set", vars::OPENAI_API_KEY))
            })?;
            info!(
                "building OpenAI LLM provider (model={})",
                config.deployment
            );
            let llm: Arc<dyn LLMProvider> = LLMBuilder::<OpenAI>::new()
                .api_key(api_key)
                .model(config.deployment.clone())
                .timeout_seconds(timeout_secs)
                .build()
                .map_err(|err| CoreError::Config(err.to_string()))?;
            Ok(llm)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn azure_requires_endpoint_and_key() {
        let config = LlmConfig::default();
        let err = build_llm_provider(&config).err().expect("missing endpoint");
        assert!(err.to_string().contains(vars::AZURE_OPENAI_ENDPOINT));

        let config = LlmConfig {
            endpoint: Some("https://example.openai.azure.com".to_string()),
            ..LlmConfig::default()
        };
        let err = build_llm_provider(&config).err().expect("missing key");
        assert!(err.to_string().contains(vars::AZURE_OPENAI_API_KEY));
    }

    #[test]
    fn openai_requires_key() {
        let config = LlmConfig {
            provider: LlmProviderKind::OpenAI,
            ..LlmConfig::default()
        };
        let err = build_llm_provider(&config).err().expect("missing key");
        assert!(err.to_string().contains(vars::OPENAI_API_KEY));
    }

    #[test]
    fn azure_builds_with_endpoint_and_key() {
        let config = LlmConfig {
            endpoint: Some("https://example.openai.azure.com/".to_string()),
            api_key: Some("secret".to_string()),
            ..LlmConfig::default()
        };
        assert!(build_llm_provider(&config).is_ok());
    }
}
