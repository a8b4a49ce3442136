//! `vmid-gen sequence` command.

use crate::call::CallContext;
use crate::config::GeneratorConfig;
use crate::lock;
use crate::sequence::SequenceStore;

/// Execute the `sequence` command.
///
/// Prints the sequential baseline, read under the generator lock so a
/// concurrent writer is never observed mid-update, or `none` if unset.
///
/// # Errors
///
/// Returns an error string if the lock cannot be taken or the store is corrupt.
pub fn run(config: &GeneratorConfig) -> Result<(), String> {
    match read_baseline(config)? {
        Some(value) => println!("{value}"),
        None => println!("none"),
    }
    Ok(())
}

fn read_baseline(config: &GeneratorConfig) -> Result<Option<u32>, String> {
    let ctx = CallContext::background().with_timeout(config.call_budget());
    let guard = lock::acquire(&config.lock_path, &ctx).map_err(|e| e.to_string())?;
    SequenceStore::new(&config.sequence_path).read(&guard).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_baseline_under_lock() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig::in_dir(dir.path());
        assert_eq!(read_baseline(&config).unwrap(), None);

        std::fs::write(&config.sequence_path, "812").unwrap();
        assert_eq!(read_baseline(&config).unwrap(), Some(812));
        assert!(run(&config).is_ok());
    }

    #[test]
    fn corrupt_store_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig::in_dir(dir.path());
        std::fs::write(&config.sequence_path, "??").unwrap();
        let err = run(&config).unwrap_err();
        assert!(err.contains("corrupt"), "{err}");
    }
}
