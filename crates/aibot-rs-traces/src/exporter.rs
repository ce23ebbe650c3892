//! Best-effort forwarding of turn traces to a remote tracing service.
//!
//! The local store is the durable record. Exporters report failures to the
//! caller, which logs them and carries on with the turn.

use crate::TraceError;
use aibot_rs_config::{EnvSource, RemoteTracingConfig};
use aibot_rs_protocol::{Metadata, TraceId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Span name recorded for every chat turn.
pub const TURN_SPAN_NAME: &str = "process_turn";

/// Everything the remote service receives about one turn.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TurnTrace {
    pub trace_id: TraceId,
    pub prompt: String,
    pub response: String,
    pub metadata: Metadata,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Sink for per-turn traces.
#[async_trait]
pub trait TraceExporter: Send + Sync {
    async fn export_turn(&self, trace: &TurnTrace) -> Result<(), TraceError>;
}

/// Exporter used when remote tracing is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTraceExporter;

#[async_trait]
impl TraceExporter for NoopTraceExporter {
    async fn export_turn(&self, _trace: &TurnTrace) -> Result<(), TraceError> {
        Ok(())
    }
}

/// POSTs one JSON document per turn to a tracing endpoint.
#[derive(Debug, Clone)]
pub struct HttpTraceExporter {
    client: reqwest::Client,
    endpoint: String,
    project_name: String,
    api_key: Option<String>,
}

impl HttpTraceExporter {
    pub fn new(
        endpoint: impl Into<String>,
        project_name: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, TraceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| TraceError::Remote(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            project_name: project_name.into(),
            api_key,
        })
    }

    fn payload(&self, trace: &TurnTrace) -> serde_json::Value {
        json!({
            "project_name": self.project_name,
            "name": TURN_SPAN_NAME,
            "trace_id": trace.trace_id,
            "input": { "prompt": trace.prompt },
            "output": { "response": trace.response },
            "metadata": trace.metadata,
            "start_time": trace.start_time,
            "end_time": trace.end_time,
        })
    }
}

#[async_trait]
impl TraceExporter for HttpTraceExporter {
    async fn export_turn(&self, trace: &TurnTrace) -> Result<(), TraceError> {
        let mut request = self.client.post(&self.endpoint).json(&self.payload(trace));
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }
        let response = request
            .send()
            .await
            .map_err(|err| TraceError::Remote(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TraceError::Remote(format!(
                "{} responded with {status}",
                self.endpoint
            )));
        }
        debug!(
            "exported turn trace (trace_id={}, endpoint={})",
            trace.trace_id, self.endpoint
        );
        Ok(())
    }
}

/// Build the exporter described by `traces.remote`.
pub fn exporter_from_config(
    config: &RemoteTracingConfig,
    env: &dyn EnvSource,
) -> Result<Arc<dyn TraceExporter>, TraceError> {
    let endpoint = match config.endpoint.as_deref() {
        Some(endpoint) if config.enabled && !endpoint.is_empty() => endpoint,
        _ => return Ok(Arc::new(NoopTraceExporter)),
    };
    let api_key = config.api_key_env.as_deref().and_then(|name| env.var(name));
    info!(
        "remote tracing enabled (endpoint={}, project={}, api_key_set={})",
        endpoint,
        config.project_name,
        api_key.is_some()
    );
    let exporter = HttpTraceExporter::new(
        endpoint,
        config.project_name.clone(),
        api_key,
        Duration::from_millis(config.timeout_ms),
    )?;
    Ok(Arc::new(exporter))
}
