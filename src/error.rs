//! Error types for every stage of identifier allocation.

use std::fmt;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures reported by an [`IdAuthority`](crate::ports::IdAuthority).
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorityError {
    /// The proposed candidate is already in use.
    #[error("identifier {0} already exists")]
    AlreadyExists(u32),

    /// The request never produced a response (connect, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The authority answered with a non-success status.
    #[error("authority returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// The response could not be understood.
    #[error("invalid authority response: {0}")]
    InvalidResponse(String),
}

impl AuthorityError {
    /// Returns `true` when the candidate collided with an existing identifier.
    #[must_use]
    pub fn is_collision(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }
}

/// Failures acquiring the advisory file lock.
#[derive(Error, Debug)]
pub enum LockError {
    /// The sentinel file could not be opened or locked.
    #[error("unable to lock {}: {source}", path.display())]
    Io {
        /// Sentinel file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Another process held the lock past the deadline.
    #[error("timed out after {waited:?} waiting for lock {}", path.display())]
    Timeout {
        /// Sentinel file path.
        path: PathBuf,
        /// Time spent waiting.
        waited: Duration,
    },

    /// The caller cancelled while waiting.
    #[error("cancelled while waiting for lock {}", path.display())]
    Cancelled {
        /// Sentinel file path.
        path: PathBuf,
    },
}

/// Failures reading or writing the sequence store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading, writing or renaming the sequence file failed.
    #[error("sequence file {} I/O error: {source}", path.display())]
    Io {
        /// Sequence file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The sequence file holds something other than a decimal integer.
    #[error("sequence file {} is corrupt ({content:?}): {source}", path.display())]
    Corrupt {
        /// Sequence file path.
        path: PathBuf,
        /// Raw file content.
        content: String,
        /// Parse failure.
        source: ParseIntError,
    },

    /// The stored baseline is already the largest representable identifier.
    #[error("sequence overflow: baseline {0} has no successor")]
    Overflow(u32),
}

/// Invalid generator configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The random range `[start, end)` contains no values.
    #[error("empty random range: start {start} must be below end {end}")]
    EmptyRange {
        /// Inclusive lower bound.
        start: u32,
        /// Exclusive upper bound.
        end: u32,
    },

    /// An environment variable held an unparsable value.
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv {
        /// Variable name.
        var: String,
        /// Raw value.
        value: String,
    },
}

/// Every authority error seen during one `next_id` call, in order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AttemptErrors(pub Vec<AuthorityError>);

impl fmt::Display for AttemptErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("no attempts made");
        }
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "attempt {}: {err}", i + 1)?;
        }
        Ok(())
    }
}

/// Failure of a single `next_id` call.
#[derive(Error, Debug)]
pub enum GenerateError {
    /// The generator lock could not be taken.
    #[error("unable to lock the ID generator: {0}")]
    Lock(#[from] LockError),

    /// The sequence store could not be read or written.
    #[error("ID generator sequence store failed: {0}")]
    Store(#[from] StoreError),

    /// The deadline passed before the authority confirmed an identifier.
    #[error("unable to retrieve the next available identifier after {elapsed:?}: {errors}")]
    Exhausted {
        /// Errors from every attempt.
        errors: AttemptErrors,
        /// Time spent in the retry loop.
        elapsed: Duration,
    },

    /// The caller cancelled during the retry loop.
    #[error("identifier allocation cancelled: {errors}")]
    Cancelled {
        /// Errors from the attempts made before cancellation.
        errors: AttemptErrors,
    },
}
