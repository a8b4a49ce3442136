//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI parser for `vmid-gen`.
#[derive(Debug, Parser)]
#[command(name = "vmid-gen", version, about = "Allocate unique VM and container identifiers")]
pub struct Cli {
    /// Directory holding the shared lock and sequence files.
    #[arg(long, global = true, env = "VMID_GEN_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Where identifiers are confirmed.
    #[command(flatten)]
    pub authority: AuthorityArgs,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Authority selection shared by all commands.
#[derive(Debug, Args)]
pub struct AuthorityArgs {
    /// Cluster API base URL, e.g. `https://pve.example.com:8006`.
    #[arg(long, global = true, env = "VMID_GEN_ENDPOINT")]
    pub endpoint: Option<String>,

    /// API token in `USER@REALM!TOKENID=SECRET` form.
    #[arg(long, global = true, env = "VMID_GEN_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Accept invalid TLS certificates.
    #[arg(long, global = true, env = "VMID_GEN_INSECURE")]
    pub insecure: bool,

    /// Dry run: confirm identifiers with an in-process authority instead of the cluster.
    ///
    /// Takes precedence over `--endpoint`. Nothing remembers which identifiers
    /// were handed out, so they are not unique across runs: once the sequence
    /// file goes stale and is purged, numbering restarts at 100.
    #[arg(long, global = true)]
    pub offline: bool,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Allocate one or more identifiers and print them, one per line.
    Next(NextArgs),
    /// Print the current sequential baseline, or `none`.
    Sequence,
}

/// Arguments for `vmid-gen next`.
#[derive(Debug, Args)]
pub struct NextArgs {
    /// Number of identifiers to allocate.
    #[arg(long, short = 'n', default_value_t = 1)]
    pub count: u32,

    /// Draw random identifiers instead of following the sequence.
    #[arg(long)]
    pub random: bool,

    /// Inclusive lower bound for random identifiers.
    #[arg(long)]
    pub range_start: Option<u32>,

    /// Exclusive upper bound for random identifiers.
    #[arg(long)]
    pub range_end: Option<u32>,

    /// Overall time limit per identifier, in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;

    #[test]
    fn parses_next_with_options() {
        let cli = Cli::parse_from([
            "vmid-gen",
            "next",
            "--count",
            "3",
            "--random",
            "--range-start",
            "1000",
            "--range-end",
            "2000",
        ]);
        let Command::Next(args) = cli.command else {
            panic!("expected next");
        };
        assert_eq!(args.count, 3);
        assert!(args.random);
        assert_eq!(args.range_start, Some(1000));
        assert_eq!(args.range_end, Some(2000));
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::parse_from(["vmid-gen", "sequence", "--state-dir", "/tmp/ids", "--offline"]);
        assert!(matches!(cli.command, Command::Sequence));
        assert!(cli.authority.offline);
        assert_eq!(cli.state_dir.as_deref(), Some(std::path::Path::new("/tmp/ids")));
    }
}
