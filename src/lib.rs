//! Cross-process allocation of unique VM and container identifiers.
//!
//! A [`Generator`] serializes allocations on one host through an advisory file
//! lock, derives candidates from a shared sequence file or a random range, and
//! has every candidate confirmed by a remote [`IdAuthority`] before returning it.

pub mod adapters;
pub mod call;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod generator;
pub mod lock;
pub mod ports;
pub mod sequence;

pub use call::{CallContext, CancelFlag};
pub use config::GeneratorConfig;
pub use error::{AuthorityError, ConfigError, GenerateError, LockError, StoreError};
pub use generator::Generator;
pub use ports::{Clock, IdAuthority};

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    commands::dispatch(&cli)
}

#[cfg(test)]
mod tests {
    use super::run;

    #[test]
    fn run_executes_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let state_dir = dir.path().to_str().unwrap();
        assert!(run(["vmid-gen", "--state-dir", state_dir, "sequence"]).is_ok());
    }

    #[test]
    fn run_errors_on_unknown_subcommand() {
        let result = run(["vmid-gen", "unknown"]);
        assert!(result.is_err());
    }
}
