//! In-process authority and clock for tests and dry runs.

use std::collections::BTreeSet;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::error::AuthorityError;
use crate::ports::{Clock, IdAuthority};

/// Lowest identifier a cluster hands out.
pub const FIRST_GUEST_ID: u32 = 100;

#[derive(Debug)]
struct State {
    taken: BTreeSet<u32>,
    first_free: u32,
    reject_next: usize,
    fail_next: usize,
    calls: Vec<Option<u32>>,
}

/// Authority backed by an in-memory set of taken identifiers.
///
/// Every identifier it returns is marked taken, so each integer is handed out
/// at most once. Rejections and transient failures can be scripted.
#[derive(Debug)]
pub struct InMemoryAuthority {
    state: Mutex<State>,
}

impl Default for InMemoryAuthority {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAuthority {
    /// An authority with nothing taken whose suggestions start at 100.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(FIRST_GUEST_ID)
    }

    /// An authority whose suggestions start at `first_free`.
    #[must_use]
    pub fn starting_at(first_free: u32) -> Self {
        Self {
            state: Mutex::new(State {
                taken: BTreeSet::new(),
                first_free,
                reject_next: 0,
                fail_next: 0,
                calls: Vec::new(),
            }),
        }
    }

    /// Marks `ids` as already in use.
    #[must_use]
    pub fn with_taken(self, ids: impl IntoIterator<Item = u32>) -> Self {
        self.lock().taken.extend(ids);
        self
    }

    /// Rejects the next `n` explicit candidates as collisions, whether free or not.
    pub fn reject_next(&self, n: usize) {
        self.lock().reject_next = n;
    }

    /// Fails the next `n` requests with a transport error.
    pub fn fail_next(&self, n: usize) {
        self.lock().fail_next = n;
    }

    /// Every candidate received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Option<u32>> {
        self.lock().calls.clone()
    }

    /// Every identifier marked taken, ascending.
    #[must_use]
    pub fn taken(&self) -> Vec<u32> {
        self.lock().taken.iter().copied().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A panicking test thread must not hide the state from the others.
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl IdAuthority for InMemoryAuthority {
    fn reserve_or_suggest(&self, candidate: Option<u32>) -> Result<u32, AuthorityError> {
        let mut state = self.lock();
        state.calls.push(candidate);

        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(AuthorityError::Transport("injected failure".into()));
        }

        match candidate {
            Some(id) => {
                if state.reject_next > 0 {
                    state.reject_next -= 1;
                    return Err(AuthorityError::AlreadyExists(id));
                }
                if !state.taken.insert(id) {
                    return Err(AuthorityError::AlreadyExists(id));
                }
                Ok(id)
            }
            None => {
                let mut id = state.first_free;
                while state.taken.contains(&id) {
                    id = id.checked_add(1).ok_or_else(|| AuthorityError::Api {
                        status: 500,
                        message: "no free identifiers".into(),
                    })?;
                }
                state.taken.insert(id);
                Ok(id)
            }
        }
    }
}

/// Clock frozen at a chosen instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
