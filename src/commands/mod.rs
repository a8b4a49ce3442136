//! Command dispatch and handlers.

pub mod next;
pub mod sequence;

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use crate::adapters::live::HttpAuthorityConfig;
use crate::adapters::memory::InMemoryAuthority;
use crate::cli::{AuthorityArgs, Cli, Command};
use crate::config::GeneratorConfig;
use crate::context::ServiceContext;

/// Dispatch a parsed command to its handler.
///
/// When `VMID_GEN_REPLAY` names a cassette file, authority answers are
/// replayed from it. When `VMID_GEN_RECORD` names a file, every authority
/// exchange is recorded there.
///
/// # Errors
///
/// Returns an error string if configuration is invalid or the command fails.
pub fn dispatch(cli: &Cli) -> Result<(), String> {
    let mut config = GeneratorConfig::from_env().map_err(|e| e.to_string())?;
    if let Some(dir) = &cli.state_dir {
        config = config.state_dir(dir);
    }

    match &cli.command {
        Command::Next(args) => {
            let ctx = service_context(&cli.authority)?;
            next::run(&ctx, config, args)
        }
        Command::Sequence => sequence::run(&config),
    }
}

/// Picks the authority: replay cassette, in-process, or the live cluster API.
fn service_context(args: &AuthorityArgs) -> Result<ServiceContext, String> {
    let (ctx, endpoint) = if let Ok(path) = env::var("VMID_GEN_REPLAY") {
        let ctx = ServiceContext::replaying(&PathBuf::from(&path)).map_err(|e| e.to_string())?;
        (ctx, format!("replay:{path}"))
    } else if args.offline {
        (ServiceContext::with_authority(Arc::new(InMemoryAuthority::new())), "offline".to_string())
    } else if let Some(endpoint) = &args.endpoint {
        let mut http = HttpAuthorityConfig::new(endpoint);
        http.api_token.clone_from(&args.api_token);
        http.insecure = args.insecure;
        (ServiceContext::live(&http).map_err(|e| e.to_string())?, endpoint.clone())
    } else {
        return Err(
            "no authority configured: pass --endpoint (or set VMID_GEN_ENDPOINT) or --offline"
                .to_string(),
        );
    };

    Ok(match env::var("VMID_GEN_RECORD") {
        Ok(path) if !path.is_empty() => ctx.recording(&PathBuf::from(path), &endpoint),
        _ => ctx,
    })
}
