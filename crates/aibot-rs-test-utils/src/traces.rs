use aibot_rs_protocol::TurnRecord;
use aibot_rs_traces::{TraceError, TraceExporter, TraceStore, TurnTrace};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Store whose appends always fail; loads return nothing.
#[derive(Debug)]
pub struct FailingTraceStore {
    path: PathBuf,
}

impl FailingTraceStore {
    pub fn new() -> Self {
        Self {
            path: PathBuf::from("unwritable/local_traces.json"),
        }
    }
}

impl Default for FailingTraceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceStore for FailingTraceStore {
    fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<TurnRecord>, TraceError> {
        Ok(Vec::new())
    }

    fn append(&self, _records: &[TurnRecord]) -> Result<(), TraceError> {
        Err(TraceError::Io {
            path: self.path.clone(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }

    fn export(&self) -> Result<Option<Vec<u8>>, TraceError> {
        Ok(None)
    }

    fn len(&self) -> usize {
        0
    }
}

/// Exporter that keeps every trace it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingExporter {
    pub traces: Arc<Mutex<Vec<TurnTrace>>>,
    pub fail: bool,
}

impl RecordingExporter {
    pub fn failing() -> Self {
        Self {
            traces: Arc::default(),
            fail: true,
        }
    }
}

#[async_trait]
impl TraceExporter for RecordingExporter {
    async fn export_turn(&self, trace: &TurnTrace) -> Result<(), TraceError> {
        self.traces.lock().push(trace.clone());
        if self.fail {
            return Err(TraceError::Remote("collector unavailable".to_string()));
        }
        Ok(())
    }
}
