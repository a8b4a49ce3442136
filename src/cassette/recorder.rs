//! Records authority exchanges into a cassette file.

use std::path::{Path, PathBuf};

use chrono::Utc;

use super::format::{Cassette, CassetteError, Exchange};
use crate::error::AuthorityError;

/// Accumulates exchanges and writes them as a YAML cassette.
#[derive(Debug)]
pub struct CassetteRecorder {
    path: PathBuf,
    name: String,
    endpoint: String,
    exchanges: Vec<Exchange>,
}

impl CassetteRecorder {
    /// Create a recorder that will write to `path`.
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self { path: path.into(), name: name.into(), endpoint: endpoint.into(), exchanges: Vec::new() }
    }

    /// Destination of the cassette file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of exchanges recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    /// Record one exchange. The `seq` field is assigned automatically.
    pub fn record(&mut self, candidate: Option<u32>, outcome: &Result<u32, AuthorityError>) {
        let seq = self.exchanges.len() as u64;
        self.exchanges.push(Exchange { seq, candidate, outcome: outcome.clone() });
    }

    /// Write everything recorded so far to the cassette file.
    ///
    /// May be called repeatedly; each call rewrites the whole file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> Result<&Path, CassetteError> {
        let cassette = Cassette {
            name: self.name.clone(),
            recorded_at: Utc::now(),
            endpoint: self.endpoint.clone(),
            exchanges: self.exchanges.clone(),
        };
        cassette.save(&self.path)?;
        Ok(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nextid.cassette.yaml");

        let mut recorder = CassetteRecorder::new(&path, "nextid-session", "https://pve:8006");
        assert!(recorder.is_empty());
        recorder.record(Some(100), &Err(AuthorityError::AlreadyExists(100)));
        recorder.record(None, &Ok(105));
        recorder.record(Some(106), &Err(AuthorityError::Transport("reset".into())));
        assert_eq!(recorder.len(), 3);

        assert_eq!(recorder.save().unwrap(), path);

        let cassette = Cassette::load(&path).unwrap();
        assert_eq!(cassette.name, "nextid-session");
        assert_eq!(cassette.endpoint, "https://pve:8006");
        let seqs: Vec<u64> = cassette.exchanges.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        assert_eq!(cassette.exchanges[1].outcome, Ok(105));
    }
}
