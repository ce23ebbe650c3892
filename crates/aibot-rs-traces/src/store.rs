use crate::TraceError;
use aibot_rs_protocol::{TraceFilter, TurnRecord, distinct_sessions};
use std::path::Path;

/// Options shared by the file-backed stores.
#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    /// Hold an advisory lock on `<file>.lock` across each read-modify-write.
    pub lock: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self { lock: true }
    }
}

/// Append-only log of turn records backed by a single file.
///
/// Disk is the source of truth. Implementations reload the file before every
/// mutation and query; the in-memory copy only backs [`TraceStore::len`].
pub trait TraceStore: Send + Sync {
    /// Backing file location.
    fn path(&self) -> &Path;

    /// Re-read the backing file. A missing file is an empty log.
    fn load(&self) -> Result<Vec<TurnRecord>, TraceError>;

    /// Persist `records` after the existing ones, in order.
    ///
    /// An empty slice is a no-op. On error nothing is considered written.
    fn append(&self, records: &[TurnRecord]) -> Result<(), TraceError>;

    /// Raw bytes of the backing file, or `None` before the first append.
    fn export(&self) -> Result<Option<Vec<u8>>, TraceError>;

    /// Records observed by the last load, append, or query.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ordered subset of the log matching every predicate in `filter`.
    fn query(&self, filter: &TraceFilter) -> Result<Vec<TurnRecord>, TraceError> {
        let records = self.load()?;
        if filter.is_empty() {
            return Ok(records);
        }
        Ok(filter.apply(&records))
    }

    /// Sorted distinct session ids, including `"unknown"` when a record lacks one.
    fn sessions(&self) -> Result<Vec<String>, TraceError> {
        let records = self.load()?;
        Ok(distinct_sessions(&records))
    }
}
