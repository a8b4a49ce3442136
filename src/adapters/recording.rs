//! Recording adapter for the `IdAuthority` port.

use std::sync::{Arc, Mutex, PoisonError};

use crate::cassette::CassetteRecorder;
use crate::error::AuthorityError;
use crate::ports::IdAuthority;

/// Records every exchange while delegating to an inner authority.
pub struct RecordingAuthority {
    inner: Box<dyn IdAuthority>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingAuthority {
    /// Wraps `inner`, appending each exchange to `recorder`.
    pub fn new(inner: Box<dyn IdAuthority>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl IdAuthority for RecordingAuthority {
    fn reserve_or_suggest(&self, candidate: Option<u32>) -> Result<u32, AuthorityError> {
        let outcome = self.inner.reserve_or_suggest(candidate);
        self.recorder
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(candidate, &outcome);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryAuthority;
    use crate::cassette::Cassette;

    #[test]
    fn records_each_exchange_with_its_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authority.cassette.yaml");
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(&path, "test", "memory")));

        let authority = RecordingAuthority::new(
            Box::new(InMemoryAuthority::new().with_taken([300])),
            Arc::clone(&recorder),
        );
        assert_eq!(authority.reserve_or_suggest(Some(300)), Err(AuthorityError::AlreadyExists(300)));
        assert_eq!(authority.reserve_or_suggest(None), Ok(100));

        recorder.lock().unwrap().save().unwrap();
        let cassette = Cassette::load(&path).unwrap();
        assert_eq!(cassette.exchanges.len(), 2);
        assert_eq!(cassette.exchanges[0].candidate, Some(300));
        assert_eq!(cassette.exchanges[0].outcome, Err(AuthorityError::AlreadyExists(300)));
        assert_eq!(cassette.exchanges[1].outcome, Ok(100));
    }
}
