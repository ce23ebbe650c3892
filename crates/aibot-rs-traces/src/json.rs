//! JSON-array backend compatible with `local_traces.json`.

use crate::disk::{self, FileLock};
use crate::{StoreOptions, TraceError, TraceStore};
use aibot_rs_protocol::TurnRecord;
use log::{debug, info};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

/// Trace store whose backing file is one pretty-printed JSON array.
///
/// Every append rewrites the whole array into `<file>.tmp` and renames it over
/// the backing file, so readers only ever see complete snapshots.
pub struct JsonTraceStore {
    path: PathBuf,
    lock_path: Option<PathBuf>,
    records: Mutex<Vec<TurnRecord>>,
}

impl JsonTraceStore {
    /// Open with the default options (advisory locking on).
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TraceError> {
        Self::open_with(path, StoreOptions::default())
    }

    pub fn open_with(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self, TraceError> {
        let path = path.as_ref().to_path_buf();
        let lock_path = if options.lock {
            Some(disk::sibling_path(&path, ".lock")?)
        } else {
            None
        };
        let store = Self {
            path,
            lock_path,
            records: Mutex::new(Vec::new()),
        };
        let loaded = store.load()?;
        info!(
            "opened json trace store (path={}, records={})",
            store.path.display(),
            loaded.len()
        );
        Ok(store)
    }

    fn read_disk(&self) -> Result<Vec<TurnRecord>, TraceError> {
        match disk::read_optional(&self.path)? {
            Some(bytes) => decode(&self.path, &bytes),
            None => Ok(Vec::new()),
        }
    }
}

impl TraceStore for JsonTraceStore {
    fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<TurnRecord>, TraceError> {
        let mut cache = self.records.lock();
        let records = self.read_disk()?;
        *cache = records.clone();
        Ok(records)
    }

    fn append(&self, records: &[TurnRecord]) -> Result<(), TraceError> {
        if records.is_empty() {
            return Ok(());
        }
        let mut cache = self.records.lock();
        let _file_lock = match &self.lock_path {
            Some(lock_path) => Some(FileLock::exclusive(lock_path)?),
            None => None,
        };
        let mut current = self.read_disk()?;
        current.extend_from_slice(records);
        let bytes = serde_json::to_vec_pretty(&current)?;
        disk::replace_atomically(&self.path, &bytes)?;
        debug!(
            "appended trace records (path={}, appended={}, total={})",
            self.path.display(),
            records.len(),
            current.len()
        );
        *cache = current;
        Ok(())
    }

    fn export(&self) -> Result<Option<Vec<u8>>, TraceError> {
        disk::read_optional(&self.path)
    }

    fn len(&self) -> usize {
        self.records.lock().len()
    }
}

/// Parse a whole backing file. Whitespace-only content is an empty log.
fn decode(path: &Path, bytes: &[u8]) -> Result<Vec<TurnRecord>, TraceError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    serde_json::from_slice(bytes).map_err(|err| TraceError::Corrupt {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}
