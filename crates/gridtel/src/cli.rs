//! Clap derive structures for the `gridtel` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// gridtel -- streaming telemetry collector for gNMI fabrics
#[derive(Debug, Parser)]
#[command(
    name = "gridtel",
    version,
    about = "Collect gNMI streaming telemetry and serve live snapshots over HTTP",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, short = 'c', env = "GRIDTEL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log line format
    #[arg(long, env = "GRIDTEL_LOG_FORMAT", default_value = "text", global = true)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the collector and the HTTP API until interrupted
    Serve(ServeArgs),

    /// Load and validate the configuration, then print the roster
    Check,

    /// Issue a gNMI Capabilities request against one configured device
    Probe(ProbeArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Listen address (overrides `server.listen`)
    #[arg(long, short = 'l')]
    pub listen: Option<String>,
}

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Device id from the configuration
    pub device: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_work_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "gridtel",
            "probe",
            "leaf1",
            "-vv",
            "--config",
            "/tmp/gridtel.toml",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.global.verbose, 2);
        assert_eq!(cli.global.log_format, LogFormat::Json);
        assert_eq!(cli.global.config, Some(PathBuf::from("/tmp/gridtel.toml")));
        assert!(matches!(cli.command, Command::Probe(ProbeArgs { ref device }) if device == "leaf1"));
    }

    #[test]
    fn probe_requires_a_device() {
        assert!(Cli::try_parse_from(["gridtel", "probe"]).is_err());
    }
}
