//! Generator configuration and environment loading.

use std::env;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Lock sentinel file name inside the state directory.
pub const LOCK_FILE_NAME: &str = "vmid-gen.lock";
/// Sequence file name inside the state directory.
pub const SEQUENCE_FILE_NAME: &str = "vmid-gen.seq";

/// Lower bound used when no random range start is configured.
pub const DEFAULT_RANGE_START: u32 = 10_000;
/// Upper bound used when no random range end is configured.
pub const DEFAULT_RANGE_END: u32 = 99_999;

/// How long one allocation may keep others waiting.
pub const DEFAULT_CONTENTION_WINDOW: Duration = Duration::from_secs(5);
/// Added to the contention window to form the per-call deadline.
pub const DEFAULT_LOCK_MARGIN: Duration = Duration::from_secs(1);
/// Fixed pause between authority attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(200);

/// Immutable generator settings, built once per process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Draw random candidates instead of following the sequence store.
    pub random_ids: bool,
    /// Inclusive lower bound for random candidates; `None` means the default.
    pub random_range_start: Option<u32>,
    /// Exclusive upper bound for random candidates; `None` means the default.
    pub random_range_end: Option<u32>,
    /// Advisory lock sentinel shared by every cooperating process.
    pub lock_path: PathBuf,
    /// Sequence store shared by every cooperating process.
    pub sequence_path: PathBuf,
    /// Bound on how long one allocation may hold others off.
    pub contention_window: Duration,
    /// Slack added to the contention window for the call deadline.
    pub lock_margin: Duration,
    /// Pause between authority attempts.
    pub retry_delay: Duration,
    /// Age past which the sequence store is purged at construction.
    pub stale_after: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::in_dir(env::temp_dir())
    }
}

impl GeneratorConfig {
    /// Sequential configuration with lock and sequence files inside `dir`.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            random_ids: false,
            random_range_start: None,
            random_range_end: None,
            lock_path: dir.join(LOCK_FILE_NAME),
            sequence_path: dir.join(SEQUENCE_FILE_NAME),
            contention_window: DEFAULT_CONTENTION_WINDOW,
            lock_margin: DEFAULT_LOCK_MARGIN,
            retry_delay: DEFAULT_RETRY_DELAY,
            stale_after: DEFAULT_CONTENTION_WINDOW,
        }
    }

    /// Moves the lock and sequence files into `dir`.
    #[must_use]
    pub fn state_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        self.lock_path = dir.join(LOCK_FILE_NAME);
        self.sequence_path = dir.join(SEQUENCE_FILE_NAME);
        self
    }

    /// Switches to random derivation.
    #[must_use]
    pub fn random(mut self, random_ids: bool) -> Self {
        self.random_ids = random_ids;
        self
    }

    /// Sets the random range `[start, end)`.
    #[must_use]
    pub fn range(mut self, start: u32, end: u32) -> Self {
        self.random_range_start = Some(start);
        self.random_range_end = Some(end);
        self
    }

    /// Sets the contention window and, with it, the staleness threshold.
    #[must_use]
    pub fn contention_window(mut self, window: Duration) -> Self {
        self.contention_window = window;
        self.stale_after = window;
        self
    }

    /// Sets the staleness threshold independently of the contention window.
    #[must_use]
    pub fn stale_after(mut self, age: Duration) -> Self {
        self.stale_after = age;
        self
    }

    /// Sets the slack added to the contention window.
    #[must_use]
    pub fn lock_margin(mut self, margin: Duration) -> Self {
        self.lock_margin = margin;
        self
    }

    /// Sets the pause between authority attempts.
    #[must_use]
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Total time budget of one `next_id` call.
    #[must_use]
    pub fn call_budget(&self) -> Duration {
        self.contention_window + self.lock_margin
    }

    /// The resolved random range, with defaults applied to unset bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyRange`] if the range holds no values.
    pub fn random_range(&self) -> Result<Range<u32>, ConfigError> {
        let start = self.random_range_start.unwrap_or(DEFAULT_RANGE_START);
        let end = self.random_range_end.unwrap_or(DEFAULT_RANGE_END);
        if start >= end {
            return Err(ConfigError::EmptyRange { start, end });
        }
        Ok(start..end)
    }

    /// Builds a configuration from `VMID_GEN_*` environment variables.
    ///
    /// Environment variables:
    /// - `VMID_GEN_RANDOM_IDS`: `true`/`1` for random derivation (default: false)
    /// - `VMID_GEN_RANGE_START`: inclusive random lower bound (default: 10000)
    /// - `VMID_GEN_RANGE_END`: exclusive random upper bound (default: 99999)
    /// - `VMID_GEN_STATE_DIR`: directory for lock and sequence files (default: temp dir)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] when a variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Like [`from_env`](Self::from_env) but reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] when a variable cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = match lookup("VMID_GEN_STATE_DIR") {
            Some(dir) if !dir.is_empty() => Self::in_dir(dir),
            _ => Self::default(),
        };

        if let Some(value) = lookup("VMID_GEN_RANDOM_IDS") {
            config.random_ids = parse_flag("VMID_GEN_RANDOM_IDS", &value)?;
        }
        config.random_range_start = parse_opt_u32(&lookup, "VMID_GEN_RANGE_START")?;
        config.random_range_end = parse_opt_u32(&lookup, "VMID_GEN_RANGE_END")?;
        Ok(config)
    }
}

/// Parses a boolean environment flag.
pub(crate) fn parse_flag(var: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv { var: var.to_string(), value: value.to_string() }),
    }
}

fn parse_opt_u32(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
) -> Result<Option<u32>, ConfigError> {
    lookup(var)
        .filter(|v| !v.trim().is_empty())
        .map(|v| {
            v.trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnv { var: var.to_string(), value: v.clone() })
        })
        .transpose()
}
