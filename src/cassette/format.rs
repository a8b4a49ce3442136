//! Cassette data structures for authority exchanges.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::AuthorityError;

/// Failure loading or saving a cassette file.
#[derive(Error, Debug)]
pub enum CassetteError {
    /// The file could not be read or written.
    #[error("cassette {} I/O error: {source}", path.display())]
    Io {
        /// Cassette path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not a valid cassette.
    #[error("cassette {} is malformed: {source}", path.display())]
    Yaml {
        /// Cassette path.
        path: PathBuf,
        /// YAML error.
        source: serde_yaml::Error,
    },
}

/// One request to the authority and what it answered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Exchange {
    /// Position in the recording (assigned by the recorder).
    pub seq: u64,
    /// Candidate sent, or `None` when the authority was asked to choose.
    pub candidate: Option<u32>,
    /// Confirmed identifier or the error returned.
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub outcome: Result<u32, AuthorityError>,
}

/// A recorded session of authority exchanges.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cassette {
    /// Human-readable name for this cassette.
    pub name: String,
    /// When this cassette was recorded.
    pub recorded_at: DateTime<Utc>,
    /// Authority the exchanges were recorded against.
    pub endpoint: String,
    /// Exchanges in the order they happened.
    pub exchanges: Vec<Exchange>,
}

impl Cassette {
    /// Reads a YAML cassette from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CassetteError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, CassetteError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| CassetteError::Io { path: path.to_path_buf(), source })?;
        serde_yaml::from_str(&content)
            .map_err(|source| CassetteError::Yaml { path: path.to_path_buf(), source })
    }

    /// Writes this cassette to `path` as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`CassetteError`] if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), CassetteError> {
        let yaml = serde_yaml::to_string(self)
            .map_err(|source| CassetteError::Yaml { path: path.to_path_buf(), source })?;
        std::fs::write(path, yaml).map_err(|source| CassetteError::Io { path: path.to_path_buf(), source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_are_readable_yaml() {
        let cassette = Cassette {
            name: "nextid".into(),
            recorded_at: Utc::now(),
            endpoint: "https://pve.example:8006".into(),
            exchanges: vec![
                Exchange { seq: 0, candidate: Some(101), outcome: Err(AuthorityError::AlreadyExists(101)) },
                Exchange { seq: 1, candidate: None, outcome: Ok(102) },
            ],
        };

        let yaml = serde_yaml::to_string(&cassette).unwrap();
        assert!(yaml.contains("AlreadyExists: 101"), "{yaml}");
        assert!(yaml.contains("Ok: 102"), "{yaml}");
        assert_eq!(serde_yaml::from_str::<Cassette>(&yaml).unwrap(), cassette);
    }

    #[test]
    fn load_reports_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.cassette.yaml");
        std::fs::write(&path, "exchanges: [1, 2").unwrap();
        assert!(matches!(Cassette::load(&path), Err(CassetteError::Yaml { .. })));
        assert!(matches!(
            Cassette::load(&dir.path().join("missing.yaml")),
            Err(CassetteError::Io { .. })
        ));
    }
}
