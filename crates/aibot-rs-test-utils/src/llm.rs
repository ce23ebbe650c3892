use async_trait::async_trait;
use autoagents_llm::chat::{
    ChatMessage, ChatProvider, ChatResponse, StructuredOutputFormat, Tool,
};
use autoagents_llm::completion::{CompletionProvider, CompletionRequest, CompletionResponse};
use autoagents_llm::embedding::EmbeddingProvider;
use autoagents_llm::error::LLMError;
use autoagents_llm::models::ModelsProvider;
use autoagents_llm::{LLMProvider, ToolCall};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Text-only chat reply.
#[derive(Debug, Clone)]
pub struct StubReply(pub String);

impl fmt::Display for StubReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl ChatResponse for StubReply {
    fn text(&self) -> Option<String> {
        Some(self.0.clone())
    }

    fn tool_calls(&self) -> Option<Vec<ToolCall>> {
        None
    }
}

/// Chat model double. Answers every request with the same text, or the same
/// provider error, and keeps each message list it was sent.
#[derive(Debug, Clone)]
pub struct StubLLM {
    reply: Result<String, String>,
    requests: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl StubLLM {
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Ok(text.into()),
            requests: Arc::default(),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            requests: Arc::default(),
        }
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().clone()
    }

    fn outcome<T>(&self, ok: impl FnOnce(&str) -> T) -> Result<T, LLMError> {
        match &self.reply {
            Ok(text) => Ok(ok(text)),
            Err(message) => Err(LLMError::ProviderError(message.clone())),
        }
    }
}

#[async_trait]
impl ChatProvider for StubLLM {
    async fn chat_with_tools(
        &self,
        messages: &[ChatMessage],
        _tools: Option<&[Tool]>,
        _json_schema: Option<StructuredOutputFormat>,
    ) -> Result<Box<dyn ChatResponse>, LLMError> {
        self.requests.lock().push(messages.to_vec());
        self.outcome(|text| Box::new(StubReply(text.to_string())) as Box<dyn ChatResponse>)
    }
}

#[async_trait]
impl CompletionProvider for StubLLM {
    async fn complete(
        &self,
        _req: &CompletionRequest,
        _json_schema: Option<StructuredOutputFormat>,
    ) -> Result<CompletionResponse, LLMError> {
        self.outcome(|text| CompletionResponse {
            text: text.to_string(),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for StubLLM {
    async fn embed(&self, input: Vec<String>) -> Result<Vec<Vec<f32>>, LLMError> {
        self.outcome(|_| input.iter().map(|_| vec![0.0, 0.0]).collect())
    }
}

#[async_trait]
impl ModelsProvider for StubLLM {}

impl LLMProvider for StubLLM {}
