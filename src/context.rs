//! Service context bundling the port trait objects.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use crate::adapters::live::{HttpAuthority, HttpAuthorityConfig, SystemClock};
use crate::adapters::memory::InMemoryAuthority;
use crate::adapters::{RecordingAuthority, ReplayingAuthority};
use crate::cassette::{Cassette, CassetteError, CassetteRecorder, CassetteReplayer};
use crate::config::GeneratorConfig;
use crate::error::{AuthorityError, ConfigError};
use crate::generator::Generator;
use crate::ports::{Clock, IdAuthority};

/// Bundles the clock and authority ports into a single context.
///
/// Constructors wire up different adapter implementations (live, in-memory,
/// recording, replaying).
pub struct ServiceContext {
    /// Clock for judging sequence-store staleness.
    pub clock: Box<dyn Clock>,
    /// Authority that confirms identifiers.
    pub authority: Arc<dyn IdAuthority>,
    /// Optional cassette recorder; saved on drop.
    recorder: Option<Arc<Mutex<CassetteRecorder>>>,
}

impl ServiceContext {
    /// Creates a live context talking to the cluster API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn live(config: &HttpAuthorityConfig) -> Result<Self, AuthorityError> {
        Ok(Self::with_authority(Arc::new(HttpAuthority::new(config)?)))
    }

    /// Creates a context around an in-process authority.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_authority(Arc::new(InMemoryAuthority::new()))
    }

    /// Creates a context around any authority, using the system clock.
    #[must_use]
    pub fn with_authority(authority: Arc<dyn IdAuthority>) -> Self {
        Self { clock: Box::new(SystemClock), authority, recorder: None }
    }

    /// Wraps `self`'s authority so every exchange is recorded to `path`.
    ///
    /// The cassette is written when the returned context is dropped.
    #[must_use]
    pub fn recording(mut self, path: &Path, endpoint: &str) -> Self {
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(path, "vmid-gen-session", endpoint)));
        let inner: Box<dyn IdAuthority> = Box::new(Arc::clone(&self.authority));
        self.authority = Arc::new(RecordingAuthority::new(inner, Arc::clone(&recorder)));
        self.recorder = Some(recorder);
        self
    }

    /// Creates a context whose authority replays the cassette at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, CassetteError> {
        let cassette = Cassette::load(path)?;
        Ok(Self::with_authority(Arc::new(ReplayingAuthority::new(CassetteReplayer::new(&cassette)))))
    }

    /// Builds a generator over this context's ports.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid.
    pub fn generator(&self, config: GeneratorConfig) -> Result<Generator, ConfigError> {
        Generator::new(config, Box::new(Arc::clone(&self.authority)), self.clock.as_ref())
    }
}

impl Drop for ServiceContext {
    fn drop(&mut self) {
        if let Some(recorder) = self.recorder.take() {
            let recorder = recorder.lock().unwrap_or_else(PoisonError::into_inner);
            match recorder.save() {
                Ok(path) => tracing::info!(path = %path.display(), "cassette saved"),
                Err(e) => tracing::error!(error = %e, "failed to write cassette"),
            }
        }
    }
}
