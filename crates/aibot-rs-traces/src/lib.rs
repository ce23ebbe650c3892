//! Durable, queryable local trace log for chat turns.
//!
//! Two backends share the [`TraceStore`] contract: [`JsonTraceStore`] keeps a
//! pretty-printed JSON array that is swapped in atomically on every append, and
//! [`JsonlTraceStore`] appends one record per line. Both reload from disk before
//! every mutation and query, so several processes may share one file.

mod disk;
mod error;
pub mod exporter;
mod json;
mod jsonl;
mod store;

pub use error::TraceError;
pub use exporter::{
    HttpTraceExporter, NoopTraceExporter, TraceExporter, TurnTrace, exporter_from_config,
};
pub use json::JsonTraceStore;
pub use jsonl::JsonlTraceStore;
pub use store::{StoreOptions, TraceStore};

use aibot_rs_config::{TraceFormat, TracesConfig};
use log::info;
use std::sync::Arc;

/// Open the store backend selected by `traces.format`.
pub fn open_trace_store(config: &TracesConfig) -> Result<Arc<dyn TraceStore>, TraceError> {
    let options = StoreOptions { lock: config.lock };
    info!(
        "opening trace store (path={}, format={:?}, lock={})",
        config.path, config.format, config.lock
    );
    let store: Arc<dyn TraceStore> = match config.format {
        TraceFormat::Json => Arc::new(JsonTraceStore::open_with(&config.path, options)?),
        TraceFormat::Jsonl => Arc::new(JsonlTraceStore::open_with(&config.path, options)?),
    };
    Ok(store)
}
