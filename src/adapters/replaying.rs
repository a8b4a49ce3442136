//! Replaying adapter for the `IdAuthority` port.

use std::sync::{Mutex, PoisonError};

use crate::cassette::CassetteReplayer;
use crate::error::AuthorityError;
use crate::ports::IdAuthority;

/// Answers requests with outcomes recorded in a cassette.
pub struct ReplayingAuthority {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingAuthority {
    /// Creates a replaying authority from a cassette replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }
}

impl IdAuthority for ReplayingAuthority {
    fn reserve_or_suggest(&self, candidate: Option<u32>) -> Result<u32, AuthorityError> {
        self.replayer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next_exchange(candidate)
            .outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::{Cassette, Exchange};
    use chrono::Utc;

    #[test]
    fn serves_recorded_outcomes() {
        let cassette = Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            endpoint: "memory".into(),
            exchanges: vec![
                Exchange { seq: 0, candidate: Some(5), outcome: Err(AuthorityError::AlreadyExists(5)) },
                Exchange { seq: 1, candidate: None, outcome: Ok(101) },
            ],
        };
        let authority = ReplayingAuthority::new(CassetteReplayer::new(&cassette));

        assert_eq!(authority.reserve_or_suggest(Some(5)), Err(AuthorityError::AlreadyExists(5)));
        assert_eq!(authority.reserve_or_suggest(None), Ok(101));
    }
}
