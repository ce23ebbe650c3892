//! File helpers shared by the store backends.

use crate::TraceError;
use log::debug;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// `<dir>/<name><suffix>` next to `path`.
pub(crate) fn sibling_path(path: &Path, suffix: &str) -> Result<PathBuf, TraceError> {
    let Some(name) = path.file_name() else {
        return Err(TraceError::InvalidPath(path.to_path_buf()));
    };
    let mut name = OsString::from(name);
    name.push(suffix);
    Ok(path.with_file_name(name))
}

/// Read the whole file, mapping a missing file to `None`.
pub(crate) fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, TraceError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(TraceError::io(path)(err)),
    }
}

/// Create the parent directory of `path` if it has one.
pub(crate) fn ensure_parent(path: &Path) -> Result<(), TraceError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(TraceError::io(parent))?;
    }
    Ok(())
}

/// Write `bytes` to `<file>.tmp`, sync it, then rename it over `path`.
pub(crate) fn replace_atomically(path: &Path, bytes: &[u8]) -> Result<(), TraceError> {
    ensure_parent(path)?;
    let tmp = sibling_path(path, ".tmp")?;
    let result = (|| {
        let mut file = File::create(&tmp).map_err(TraceError::io(&tmp))?;
        file.write_all(bytes).map_err(TraceError::io(&tmp))?;
        file.sync_all().map_err(TraceError::io(&tmp))?;
        fs::rename(&tmp, path).map_err(TraceError::io(path))
    })();
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    debug!(
        "replaced trace file (path={}, bytes={})",
        path.display(),
        bytes.len()
    );
    result
}

/// Append `bytes` with a single write on an append-mode handle, then sync.
pub(crate) fn append_synced(path: &Path, bytes: &[u8]) -> Result<(), TraceError> {
    ensure_parent(path)?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(TraceError::io(path))?;
    file.write_all(bytes).map_err(TraceError::io(path))?;
    file.sync_all().map_err(TraceError::io(path))
}

/// Advisory lock on a sibling lock file, released on drop.
pub(crate) struct FileLock {
    file: File,
}

impl FileLock {
    pub(crate) fn exclusive(lock_path: &Path) -> Result<Self, TraceError> {
        let file = Self::open(lock_path)?;
        fs2::FileExt::lock_exclusive(&file).map_err(|source| TraceError::Lock {
            path: lock_path.to_path_buf(),
            source,
        })?;
        Ok(Self { file })
    }

    pub(crate) fn shared(lock_path: &Path) -> Result<Self, TraceError> {
        let file = Self::open(lock_path)?;
        fs2::FileExt::lock_shared(&file).map_err(|source| TraceError::Lock {
            path: lock_path.to_path_buf(),
            source,
        })?;
        Ok(Self { file })
    }

    fn open(lock_path: &Path) -> Result<File, TraceError> {
        ensure_parent(lock_path)?;
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(lock_path)
            .map_err(|source| TraceError::Lock {
                path: lock_path.to_path_buf(),
                source,
            })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn sibling_path_appends_suffix() {
        let path = sibling_path(Path::new("data/local_traces.json"), ".lock").expect("path");
        assert_eq!(path, PathBuf::from("data/local_traces.json.lock"));
    }

    #[test]
    fn sibling_path_rejects_bare_parent() {
        assert!(sibling_path(Path::new(".."), ".tmp").is_err());
    }

    #[test]
    fn replace_leaves_no_temp_file() {
        let temp = TempDir::new().expect("tmp");
        let path = temp.path().join("nested").join("log.json");
        replace_atomically(&path, b"[]").expect("write");
        replace_atomically(&path, b"[1]").expect("rewrite");
        assert_eq!(fs::read(&path).expect("read"), b"[1]");
        assert!(!temp.path().join("nested").join("log.json.tmp").exists());
    }

    #[test]
    fn missing_file_reads_as_none() {
        let temp = TempDir::new().expect("tmp");
        assert_eq!(read_optional(&temp.path().join("absent")).expect("read"), None);
    }
}
