//! `vmid-gen next` command.

use std::time::Duration;

use crate::call::CallContext;
use crate::cli::NextArgs;
use crate::config::GeneratorConfig;
use crate::context::ServiceContext;

/// Execute the `next` command.
///
/// Allocates `args.count` identifiers one after another and prints each on
/// its own line as soon as it is confirmed.
///
/// # Errors
///
/// Returns an error string if the configuration is invalid or any allocation fails.
pub fn run(ctx: &ServiceContext, mut config: GeneratorConfig, args: &NextArgs) -> Result<(), String> {
    if args.random {
        config.random_ids = true;
    }
    if args.range_start.is_some() {
        config.random_range_start = args.range_start;
    }
    if args.range_end.is_some() {
        config.random_range_end = args.range_end;
    }

    let generator = ctx.generator(config).map_err(|e| e.to_string())?;
    for _ in 0..args.count {
        let id = generator.next_id(&call_context(args)).map_err(|e| e.to_string())?;
        println!("{id}");
    }
    Ok(())
}

/// A fresh context per identifier, so `--timeout-secs` bounds each allocation.
fn call_context(args: &NextArgs) -> CallContext {
    match args.timeout_secs {
        Some(secs) => CallContext::background().with_timeout(Duration::from_secs(secs)),
        None => CallContext::background(),
    }
}
