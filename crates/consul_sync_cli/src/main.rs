//! consul-sync CLI
//!
//! Moves key-value pairs between a local and a staging Consul.
//!
//! # Actions
//!
//! - `--backup` - Snapshot the local store to `local_backup_<timestamp>.json`
//! - `--export` - Snapshot the staging store to `consul_export.json`
//! - `--import` - Back up the local store, then write `consul_export.json`
//!   into it, filtered by `--from-prefix` and relocated under `--to-prefix`
//!
//! Actions can be combined and always run in the order above.
//!
//! # Environment
//!
//! `LOCAL_CONSUL_ADDR`, `LOCAL_CONSUL_TOKEN`, `STAGING_CONSUL_ADDR`,
//! `STAGING_CONSUL_TOKEN`.

mod commands;

use clap::Parser;
use consul_sync_core::{PrefixRewrite, SyncConfig, SyncOrchestrator, SyncPlan, SyncResult};
use consul_sync_http::HttpConnector;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::error;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
Usage:
  consul-sync --backup
  consul-sync --export
  consul-sync --import

Import options:
  --from-prefix=\"serviceA/\"
  --to-prefix=\"localA/\"

Run with --help for all options.";

/// Backup, export and import Consul KV data.
#[derive(Parser, Debug)]
#[command(name = "consul-sync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Backup local Consul KV
    #[arg(long)]
    backup: bool,

    /// Export staging KV to consul_export.json
    #[arg(long)]
    export: bool,

    /// Backup local + import staging into local
    #[arg(long)]
    import: bool,

    /// Only import keys under this prefix (default root)
    #[arg(long, value_name = "PREFIX", default_value = "")]
    from_prefix: String,

    /// Rewrite imported keys to this prefix (default root)
    #[arg(long, value_name = "PREFIX", default_value = "")]
    to_prefix: String,

    /// Directory snapshot files are written to and read from
    #[arg(long, value_name = "PATH", default_value = ".")]
    dir: PathBuf,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    timeout: u64,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn plan(&self) -> SyncPlan {
        SyncPlan {
            backup: self.backup,
            export: self.export,
            import: self
                .import
                .then(|| PrefixRewrite::new(&self.from_prefix, &self.to_prefix)),
        }
    }

    fn config(&self) -> SyncConfig {
        SyncConfig::from_env()
            .with_snapshot_dir(&self.dir)
            .with_request_timeout(Duration::from_secs(self.timeout))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    let plan = cli.plan();
    if plan.is_empty() {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    }

    match execute(cli.config(), &plan) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}

fn execute(config: SyncConfig, plan: &SyncPlan) -> SyncResult<()> {
    config.validate()?;
    let connector = HttpConnector::new(config.request_timeout);
    let orchestrator = SyncOrchestrator::new(config, connector);
    commands::run(&orchestrator, plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("consul-sync").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn no_action_is_empty_plan() {
        assert!(parse(&[]).plan().is_empty());
        assert!(parse(&["--from-prefix", "a/"]).plan().is_empty());
    }

    #[test]
    fn import_carries_prefixes() {
        let cli = parse(&["--import", "--from-prefix=serviceA/", "--to-prefix=localA/"]);
        let plan = cli.plan();
        assert!(!plan.backup);
        assert!(!plan.export);
        assert_eq!(plan.import, Some(PrefixRewrite::new("serviceA/", "localA/")));
    }

    #[test]
    fn prefixes_default_to_empty() {
        let plan = parse(&["--import"]).plan();
        assert_eq!(plan.import, Some(PrefixRewrite::identity()));
    }

    #[test]
    fn all_actions_combine() {
        let plan = parse(&["--backup", "--export", "--import"]).plan();
        assert!(plan.backup && plan.export && plan.import.is_some());
    }

    #[test]
    fn explicit_empty_prefix_is_accepted() {
        let plan = parse(&["--import", "--to-prefix="]).plan();
        assert_eq!(plan.import.unwrap().to_prefix(), "");
    }

    #[test]
    fn ambient_options() {
        let cli = parse(&["--backup", "--dir", "/tmp/snaps", "--timeout", "5", "-v"]);
        assert_eq!(cli.dir, PathBuf::from("/tmp/snaps"));
        assert_eq!(cli.timeout, 5);
        assert!(cli.verbose);
    }
}
