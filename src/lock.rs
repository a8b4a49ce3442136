//! Advisory file lock shared by unrelated processes on one host.
//!
//! The lock is an exclusive OS advisory lock on a sentinel file. Every open
//! handle is a separate lock owner, so two threads in one process exclude each
//! other exactly like two processes do. Coordination is host-local only.

use std::fs::{self, File, OpenOptions, TryLockError};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::call::{CallContext, Wait};
use crate::error::LockError;

/// Pause between attempts while another owner holds the lock.
const RETRY_INTERVAL: Duration = Duration::from_millis(25);

/// Proof that the caller holds the advisory lock. Dropping it releases the lock.
#[derive(Debug)]
pub struct LockGuard {
    file: File,
    path: PathBuf,
}

impl LockGuard {
    /// Path of the sentinel file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            // Closing the handle below still releases the lock.
            tracing::warn!(path = %self.path.display(), error = %e, "explicit unlock failed");
        }
        tracing::trace!(path = %self.path.display(), "lock released");
    }
}

/// Blocks until the lock at `path` is held, the context deadline passes, or the caller cancels.
///
/// The sentinel file and its parent directory are created if missing.
///
/// # Errors
///
/// Returns [`LockError::Timeout`] or [`LockError::Cancelled`] when the wait is cut short, and
/// [`LockError::Io`] when the sentinel cannot be opened or locked.
pub fn acquire(path: &Path, ctx: &CallContext) -> Result<LockGuard, LockError> {
    let io_err = |source| LockError::Io { path: path.to_path_buf(), source };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(io_err)?;

    let started = Instant::now();
    loop {
        match file.try_lock() {
            Ok(()) => {
                tracing::trace!(path = %path.display(), waited = ?started.elapsed(), "lock acquired");
                return Ok(LockGuard { file, path: path.to_path_buf() });
            }
            Err(TryLockError::WouldBlock) => {}
            Err(TryLockError::Error(source)) => return Err(io_err(source)),
        }

        match ctx.sleep(RETRY_INTERVAL) {
            Wait::Elapsed => {}
            Wait::DeadlineReached => {
                return Err(LockError::Timeout {
                    path: path.to_path_buf(),
                    waited: started.elapsed(),
                });
            }
            Wait::Cancelled => return Err(LockError::Cancelled { path: path.to_path_buf() }),
        }
    }
}
