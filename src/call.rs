//! Caller deadline and cancellation shared by every blocking step.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Granularity of interruptible sleeps.
const POLL_SLICE: Duration = Duration::from_millis(10);

/// Cloneable cancellation flag. Cancelling any clone cancels them all.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates a flag that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Outcome of an interruptible wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// The full pause elapsed.
    Elapsed,
    /// The deadline arrived first.
    DeadlineReached,
    /// The caller cancelled.
    Cancelled,
}

/// Per-call deadline and cancellation, passed to every blocking operation.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancel: CancelFlag,
}

impl CallContext {
    /// A context with no deadline that is never cancelled.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Returns a copy whose deadline is at most `timeout` from now.
    ///
    /// A timeout too large to represent as an instant adds no deadline.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.clone(),
        }
    }

    /// Returns a copy whose deadline is the earlier of the current one and `deadline`.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        };
        Self { deadline: Some(deadline), cancel: self.cancel.clone() }
    }

    /// Returns a copy observing `cancel`.
    #[must_use]
    pub fn with_cancel(&self, cancel: CancelFlag) -> Self {
        Self { deadline: self.deadline, cancel }
    }

    /// The effective deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns `true` if the caller cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Returns `true` if the deadline has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Sleeps for `pause`, waking early on cancellation or when the deadline arrives.
    pub fn sleep(&self, pause: Duration) -> Wait {
        let until = Instant::now().checked_add(pause);
        loop {
            if self.is_cancelled() {
                return Wait::Cancelled;
            }
            let now = Instant::now();
            if self.deadline.is_some_and(|d| now >= d) {
                return Wait::DeadlineReached;
            }
            let mut slice = POLL_SLICE;
            if let Some(until) = until {
                if now >= until {
                    return Wait::Elapsed;
                }
                slice = slice.min(until - now);
            }
            if let Some(d) = self.deadline {
                slice = slice.min(d - now);
            }
            thread::sleep(slice);
        }
    }
}
