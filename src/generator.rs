//! Identifier generator: lock, derive, validate, persist.
//!
//! One [`Generator::next_id`] call runs entirely under the advisory file lock:
//!
//! 1. acquire the lock, bounded by the call deadline;
//! 2. derive a candidate (random in range, or sequence baseline + 1);
//! 3. ask the authority to confirm it, retrying with a fixed pause until the
//!    deadline; after a collision in sequential mode the authority picks;
//! 4. in sequential mode, persist the confirmed identifier as the new baseline;
//! 5. release the lock (the guard drops on every path).

use std::ops::Range;
use std::time::{Duration, Instant};

use backon::{BlockingRetryable, ConstantBuilder};
use rand::Rng;

use crate::call::CallContext;
use crate::config::GeneratorConfig;
use crate::error::{AttemptErrors, AuthorityError, ConfigError, GenerateError, StoreError};
use crate::lock::{self, LockGuard};
use crate::ports::{Clock, IdAuthority};
use crate::sequence::SequenceStore;

/// Result of one pass through the retry loop that produced no identifier.
#[derive(Debug)]
enum Attempt {
    /// The authority answered with an error.
    Failed {
        /// One-based attempt number.
        number: usize,
        /// Candidate that was sent.
        candidate: Option<u32>,
        /// What the authority said.
        error: AuthorityError,
    },
    /// The deadline passed or the caller cancelled during the pause.
    Stopped,
}

/// Allocates authority-confirmed identifiers, coordinated across processes.
pub struct Generator {
    config: GeneratorConfig,
    range: Range<u32>,
    store: SequenceStore,
    authority: Box<dyn IdAuthority>,
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("config", &self.config)
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}

impl Generator {
    /// Builds a generator and, in sequential mode, purges a stale sequence store.
    ///
    /// The purge runs under the lock and is best-effort: if the lock cannot be
    /// taken within the call budget it is skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyRange`] if the configured random range is empty or inverted.
    pub fn new(
        config: GeneratorConfig,
        authority: Box<dyn IdAuthority>,
        clock: &dyn Clock,
    ) -> Result<Self, ConfigError> {
        let range = config.random_range()?;
        let store = SequenceStore::new(&config.sequence_path);

        if !config.random_ids {
            let ctx = CallContext::background().with_timeout(config.call_budget());
            match lock::acquire(&config.lock_path, &ctx) {
                Ok(guard) => {
                    store.purge_if_stale(&guard, config.stale_after, clock.now());
                }
                Err(e) => tracing::warn!(error = %e, "skipping sequence staleness check"),
            }
        }

        Ok(Self { config, range, store, authority })
    }

    /// The configuration this generator was built with.
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Returns the next available identifier, confirmed by the authority.
    ///
    /// The call deadline is the earlier of the caller's and the configured
    /// contention window plus lock margin. The first authority attempt always
    /// runs once the lock is held; the deadline bounds the retries.
    ///
    /// # Errors
    ///
    /// - [`GenerateError::Lock`] if the lock cannot be taken (never retried).
    /// - [`GenerateError::Store`] if the sequence store is corrupt or unwritable (never retried).
    /// - [`GenerateError::Exhausted`] if the deadline passes, holding every attempt's error.
    /// - [`GenerateError::Cancelled`] if the caller cancels during the retry loop.
    pub fn next_id(&self, ctx: &CallContext) -> Result<u32, GenerateError> {
        let ctx = ctx.with_timeout(self.config.call_budget());
        let guard = lock::acquire(&self.config.lock_path, &ctx)?;

        let id = self.validate(&guard, &ctx)?;
        if !self.config.random_ids {
            self.store.write(&guard, id)?;
        }

        tracing::info!(id, random = self.config.random_ids, "allocated identifier");
        Ok(id)
    }

    fn validate(&self, guard: &LockGuard, ctx: &CallContext) -> Result<u32, GenerateError> {
        let started = Instant::now();
        let mut errors = Vec::new();
        let mut candidate =
            if self.config.random_ids { None } else { self.sequential_candidate(guard)? };
        if ctx.is_cancelled() {
            return Err(GenerateError::Cancelled { errors: AttemptErrors(errors) });
        }

        let attempt = || {
            // A pause cut short by the deadline or cancellation ends the loop with no new request.
            if !errors.is_empty() && (ctx.is_cancelled() || ctx.is_expired()) {
                return Err(Attempt::Stopped);
            }
            if self.config.random_ids {
                candidate = Some(rand::rng().random_range(self.range.clone()));
            }

            let number = errors.len() + 1;
            tracing::debug!(attempt = number, ?candidate, "validating candidate");
            match self.authority.reserve_or_suggest(candidate) {
                Ok(id) => Ok(id),
                Err(error) => {
                    let tried = candidate;
                    if error.is_collision() && !self.config.random_ids {
                        candidate = None;
                    }
                    errors.push(error.clone());
                    Err(Attempt::Failed { number, candidate: tried, error })
                }
            }
        };

        let backoff =
            ConstantBuilder::default().with_delay(self.config.retry_delay).without_max_times();
        let sleeper = ctx.clone();
        let outcome = attempt
            .retry(backoff)
            .sleep(move |pause: Duration| {
                let _ = sleeper.sleep(pause);
            })
            .when(|outcome| {
                matches!(outcome, Attempt::Failed { .. }) && !ctx.is_expired() && !ctx.is_cancelled()
            })
            .notify(|outcome, pause| {
                if let Attempt::Failed { number, candidate, error } = outcome {
                    tracing::warn!(
                        attempt = number,
                        ?candidate,
                        error = %error,
                        retry_in = ?pause,
                        "identifier attempt failed, retrying"
                    );
                }
            })
            .call();

        match outcome {
            Ok(id) => Ok(id),
            Err(_) if ctx.is_cancelled() => {
                Err(GenerateError::Cancelled { errors: AttemptErrors(errors) })
            }
            Err(_) => Err(GenerateError::Exhausted {
                errors: AttemptErrors(errors),
                elapsed: started.elapsed(),
            }),
        }
    }

    fn sequential_candidate(&self, guard: &LockGuard) -> Result<Option<u32>, StoreError> {
        match self.store.read(guard)? {
            Some(last) => last.checked_add(1).map(Some).ok_or(StoreError::Overflow(last)),
            None => Ok(None),
        }
    }
}
