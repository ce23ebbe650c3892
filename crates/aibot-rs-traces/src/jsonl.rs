//! Line-delimited backend: one JSON record per line, appended in place.

use crate::disk::{self, FileLock};
use crate::{StoreOptions, TraceError, TraceStore};
use aibot_rs_protocol::TurnRecord;
use log::{debug, info};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

/// Append-only trace store writing one JSON object per line.
pub struct JsonlTraceStore {
    path: PathBuf,
    lock_path: Option<PathBuf>,
    records: Mutex<Vec<TurnRecord>>,
}

impl JsonlTraceStore {
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
            "opened jsonl trace store (path={}, records={})",
            store.path.display(),
            loaded.len()
        );
        Ok(store)
    }

    fn read_disk(&self) -> Result<Vec<TurnRecord>, TraceError> {
        self.read_raw().map(|(records, _)| records)
    }

    /// Records on disk, plus whether the file ends mid-line.
    fn read_raw(&self) -> Result<(Vec<TurnRecord>, bool), TraceError> {
        match disk::read_optional(&self.path)? {
            Some(bytes) => {
                let unterminated = bytes.last().is_some_and(|&byte| byte != b'\n');
                Ok((decode(&self.path, &bytes)?, unterminated))
            }
            None => Ok((Vec::new(), false)),
        }
    }

    fn read_lock(&self) -> Result<Option<FileLock>, TraceError> {
        self.lock_path.as_deref().map(FileLock::shared).transpose()
    }
}

impl TraceStore for JsonlTraceStore {
    fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<TurnRecord>, TraceError> {
        let mut cache = self.records.lock();
        let _file_lock = self.read_lock()?;
        let records = self.read_disk()?;
        *cache = records.clone();
        Ok(records)
    }

    fn append(&self, records: &[TurnRecord]) -> Result<(), TraceError> {
        if records.is_empty() {
            return Ok(());
        }
        let mut cache = self.records.lock();
        let _file_lock = self
            .lock_path
            .as_deref()
            .map(FileLock::exclusive)
            .transpose()?;
        let (mut current, unterminated) = self.read_raw()?;

        let mut buf = Vec::new();
        if unterminated {
            buf.push(b'\n');
        }
        for record in records {
            serde_json::to_writer(&mut buf, record)?;
            buf.push(b'\n');
        }
        disk::append_synced(&self.path, &buf)?;

        current.extend_from_slice(records);
        debug!(
            "appended trace lines (path={}, appended={}, total={})",
            self.path.display(),
            records.len(),
            current.len()
        );
        *cache = current;
        Ok(())
    }

    fn export(&self) -> Result<Option<Vec<u8>>, TraceError> {
        let _file_lock = self.read_lock()?;
        disk::read_optional(&self.path)
    }

    fn len(&self) -> usize {
        self.records.lock().len()
    }
}

fn decode(path: &Path, bytes: &[u8]) -> Result<Vec<TurnRecord>, TraceError> {
    let text = std::str::from_utf8(bytes).map_err(|err| TraceError::Corrupt {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    let mut records = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(line).map_err(|err| TraceError::Corrupt {
            path: path.to_path_buf(),
            reason: format!("line {}: {err}", idx + 1),
        })?;
        records.push(record);
    }
    Ok(records)
}
