//! One chat turn: tools, model reply, trace persistence.

use crate::{ChatSession, CoreError, MetadataCollector, RequestContext};
use aibot_rs_protocol::{
    Role, SESSION_ID_KEY, TURN_KEY, TraceId, TurnRecord, new_trace_id, unix_timestamp,
};
use aibot_rs_tools::{Tool, ToolContext, ToolError, ToolRegistry, extract_code_block};
use aibot_rs_traces::{NoopTraceExporter, TraceExporter, TraceStore, TurnTrace};
use autoagents_llm::LLMProvider;
use autoagents_llm::chat::{ChatMessage, ChatProvider, ChatRole, MessageType};
use chrono::Utc;
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;

/// Result of a persisted turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub trace_id: TraceId,
    /// Combined assistant reply as shown to the user.
    pub response: String,
    /// 1-based turn index within the session.
    pub turn: u32,
    /// The user and assistant records appended to the log.
    pub records: Vec<TurnRecord>,
}

/// Runs chat turns and records each one in the trace store.
pub struct TurnRunner {
    llm: Arc<dyn LLMProvider>,
    tools: ToolRegistry,
    tool_ctx: ToolContext,
    metadata: MetadataCollector,
    store: Arc<dyn TraceStore>,
    exporter: Arc<dyn TraceExporter>,
    last_timestamp: Mutex<f64>,
}

/// Builder for [`TurnRunner`].
pub struct TurnRunnerBuilder {
    llm: Arc<dyn LLMProvider>,
    store: Arc<dyn TraceStore>,
    tools: ToolRegistry,
    tool_ctx: Option<ToolContext>,
    metadata: MetadataCollector,
    exporter: Arc<dyn TraceExporter>,
}

impl TurnRunnerBuilder {
    pub fn tools(mut self, tools: ToolRegistry, ctx: ToolContext) -> Self {
        self.tools = tools;
        self.tool_ctx = Some(ctx);
        self
    }

    pub fn metadata(mut self, metadata: MetadataCollector) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn exporter(mut self, exporter: Arc<dyn TraceExporter>) -> Self {
        self.exporter = exporter;
        self
    }

    pub fn build(self) -> TurnRunner {
        TurnRunner {
            llm: self.llm,
            tools: self.tools,
            tool_ctx: self.tool_ctx.unwrap_or_else(|| ToolContext::for_root(".")),
            metadata: self.metadata,
            store: self.store,
            exporter: self.exporter,
            last_timestamp: Mutex::new(0.0),
        }
    }
}

impl TurnRunner {
    /// Start building a runner. Tools default to none, metadata to sentinels
    /// and remote tracing to a no-op.
    pub fn builder(llm: Arc<dyn LLMProvider>, store: Arc<dyn TraceStore>) -> TurnRunnerBuilder {
        TurnRunnerBuilder {
            llm,
            store,
            tools: ToolRegistry::new(),
            tool_ctx: None,
            metadata: MetadataCollector::disabled(),
            exporter: Arc::new(NoopTraceExporter),
        }
    }

    pub fn store(&self) -> &Arc<dyn TraceStore> {
        &self.store
    }

    /// Process one prompt and append its user and assistant records.
    ///
    /// Tool and model failures become part of the reply text. Only a failure
    /// to persist the records is returned as an error, in which case the
    /// session is left unchanged.
    pub async fn run_turn(
        &self,
        session: &mut ChatSession,
        prompt: &str,
        request: &RequestContext,
    ) -> Result<TurnOutcome, CoreError> {
        let started_at = Utc::now();
        let user_timestamp = self.next_timestamp();
        let turn = session.next_turn();
        info!(
            "running turn (session_id={}, turn={}, prompt_len={})",
            session.id(),
            turn,
            prompt.len()
        );

        let mut metadata = self.metadata.collect(request).await;
        metadata.insert(SESSION_ID_KEY.to_string(), json!(session.id()));
        metadata.insert(TURN_KEY.to_string(), json!(turn));

        let response = self.compose_response(prompt).await;
        let trace_id = new_trace_id();
        let records = vec![
            TurnRecord::new(
                Role::User,
                prompt,
                trace_id.clone(),
                metadata.clone(),
                user_timestamp,
            ),
            TurnRecord::new(
                Role::Assistant,
                response.clone(),
                trace_id.clone(),
                metadata.clone(),
                self.next_timestamp(),
            ),
        ];

        let store = self.store.clone();
        let to_append = records.clone();
        tokio::task::spawn_blocking(move || store.append(&to_append))
            .await
            .map_err(|err| CoreError::Internal(err.to_string()))??;
        debug!(
            "persisted turn (trace_id={}, total_records={})",
            trace_id,
            self.store.len()
        );

        let trace = TurnTrace {
            trace_id: trace_id.clone(),
            prompt: prompt.to_string(),
            response: response.clone(),
            metadata,
            start_time: started_at,
            end_time: Utc::now(),
        };
        if let Err(err) = self.exporter.export_turn(&trace).await {
            warn!("remote trace export failed (trace_id={trace_id}): {err}");
        }

        session.record_turn(prompt, &response, &trace_id);
        Ok(TurnOutcome {
            trace_id,
            response,
            turn,
            records,
        })
    }

    /// Tool sections in fixed order, then the model reply, blank-line separated.
    async fn compose_response(&self, prompt: &str) -> String {
        let lowered = prompt.to_lowercase();
        let mut parts = Vec::new();

        if (lowered.contains("calculate") || lowered.contains("math"))
            && self.tools.contains("Calculator")
        {
            parts.push(
                match self
                    .call_tool("Calculator", json!({ "expression": prompt }))
                    .await
                {
                    Ok(output) => format!("Calculator Result: {}", text_field(&output, "result")),
                    Err(err) => format!("Calculator Error: {err}"),
                },
            );
        }

        if (lowered.contains("read file") || lowered.contains("open file"))
            && self.tools.contains("FileReader")
        {
            parts.push(match self.call_tool("FileReader", json!({})).await {
                Ok(output) => format!("File Content:\n{}", text_field(&output, "content")),
                Err(err) => format!("File Read Error: {err}"),
            });
        }

        if self.tools.contains("CodeExec")
            && let Some(code) = extract_code_block(prompt)
        {
            parts.push(match self.call_tool("CodeExec", json!({ "code": code })).await {
                Ok(output) => format!("Code Output:\n{}", exec_output(&output)),
                Err(err) => format!("Code Execution Error: {err}"),
            });
        }

        parts.push(format!("AI Response:\n{}", self.model_reply(prompt).await));
        parts.join("\n\n")
    }

    async fn call_tool(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::ToolNotFound(name.to_string()))?;
        let result = tool.call(&self.tool_ctx, args).await;
        if let Err(err) = &result {
            warn!("tool failed (name={name}): {err}");
        }
        result
    }

    async fn model_reply(&self, prompt: &str) -> String {
        let messages = [ChatMessage {
            role: ChatRole::User,
            message_type: MessageType::Text,
            content: prompt.to_string(),
        }];
        match self.llm.chat_with_tools(&messages, None, None).await {
            Ok(response) => response.text().unwrap_or_default(),
            Err(err) => {
                warn!("chat completion failed: {err}");
                format!("OpenAI call error: {err}")
            }
        }
    }

    /// Wall-clock seconds, never earlier than the previous value issued.
    fn next_timestamp(&self) -> f64 {
        let mut last = self.last_timestamp.lock();
        let now = unix_timestamp(Utc::now()).max(*last);
        *last = now;
        now
    }
}

fn text_field(output: &Value, key: &str) -> String {
    match output.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => output.to_string(),
    }
}

fn exec_output(output: &Value) -> String {
    let stdout = text_field(output, "stdout");
    let stderr = output
        .get("stderr")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if stderr.is_empty() {
        stdout
    } else if stdout.is_empty() {
        stderr.to_string()
    } else {
        format!("{stdout}\n{stderr}")
    }
}
