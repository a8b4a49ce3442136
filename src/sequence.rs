//! Persisted baseline for sequential allocation.
//!
//! The store is one decimal integer in a well-known file. It performs no
//! locking of its own: every operation takes a [`LockGuard`] as proof that the
//! caller holds the generator lock.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::lock::LockGuard;

/// File-backed sequence store.
#[derive(Debug, Clone)]
pub struct SequenceStore {
    path: PathBuf,
}

impl SequenceStore {
    /// Creates a store backed by the file at `path`. Nothing is touched on disk.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the sequence file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored baseline. A missing file is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupt`] if the file holds anything but a decimal
    /// integer, and [`StoreError::Io`] for other read failures.
    pub fn read(&self, _lock: &LockGuard) -> Result<Option<u32>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path: self.path.clone(), source }),
        };

        content.trim().parse::<u32>().map(Some).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            content,
            source,
        })
    }

    /// Atomically replaces the stored baseline with `value`.
    ///
    /// The value is written to a uniquely named sibling file which is then
    /// renamed over the target, so readers never observe a partial write.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the temporary file cannot be written or renamed.
    pub fn write(&self, _lock: &LockGuard, value: u32) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io { path: self.path.clone(), source };

        let file_name = self.path.file_name().map_or_else(
            || "sequence".to_string(),
            |name| name.to_string_lossy().into_owned(),
        );
        let tmp = self.path.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4()));

        let result = (|| {
            let mut file = fs::File::create(&tmp)?;
            write!(file, "{value}")?;
            file.sync_all()?;
            fs::rename(&tmp, &self.path)
        })();

        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result.map_err(io_err)
    }

    /// Deletes the store if it was last modified more than `max_age` before `now`.
    ///
    /// Best-effort: stat and remove failures are logged and swallowed. Returns
    /// `true` only if a stale file was removed.
    pub fn purge_if_stale(&self, _lock: &LockGuard, max_age: Duration, now: DateTime<Utc>) -> bool {
        let modified = match fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(modified) => DateTime::<Utc>::from(modified),
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    tracing::debug!(path = %self.path.display(), error = %e, "cannot stat sequence file");
                }
                return false;
            }
        };

        // A modification time in the future counts as fresh.
        let Ok(age) = (now - modified).to_std() else {
            return false;
        };
        if age <= max_age {
            return false;
        }

        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), ?age, "purged stale sequence file");
                true
            }
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "cannot purge sequence file");
                false
            }
        }
    }
}
