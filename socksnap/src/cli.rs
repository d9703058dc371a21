//! # Cli
//!
//! Command line interface of the daemon.

use std::{path::PathBuf, str::FromStr};

use anyhow::{anyhow, Result};
use clap::{builder::PossibleValuesParser, Parser, ValueEnum};
use log::LevelFilter;

/// Default sampling interval, in microseconds.
pub(crate) const DEFAULT_INTERVAL_US: u64 = 1_000_000;

/// Samples the kernel TCP and UDP socket tables and streams snapshots to
/// a named pipe.
///
/// On each tick the live protocol control block tables are queried,
/// decoded and written to the pipe as one tab-separated batch per
/// protocol, so external tooling can observe socket-level network
/// activity without calling platform APIs itself.
#[derive(Parser, Debug)]
#[command(name = "socksnap", version)]
pub(crate) struct Cli {
    #[arg(
        long,
        value_parser = PossibleValuesParser::new(["error", "warn", "info", "debug", "trace"]),
        default_value = "info",
        help = "Log level",
    )]
    pub(crate) log_level: String,
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_INTERVAL_US,
        help = "Sampling interval, in microseconds"
    )]
    pub(crate) interval: u64,
    #[arg(
        short,
        long,
        visible_alias = "pipe_path",
        default_value = "/tmp/socksnap.pipe",
        help = "Named pipe the snapshots are written to. Must exist and have a reader"
    )]
    pub(crate) pipe_path: PathBuf,
    #[arg(
        long,
        help = "Echo records to stdout in addition to the pipe (most useful with --foreground)"
    )]
    pub(crate) print: bool,
    #[arg(
        long,
        value_enum,
        default_value_t = CliDisplayFormat::Text,
        help = "Format used by --print"
    )]
    pub(crate) format: CliDisplayFormat,
    #[arg(long, help = "Stay in the foreground instead of daemonizing")]
    pub(crate) foreground: bool,
}

impl Cli {
    pub(crate) fn log_level(&self) -> Result<LevelFilter> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|e| anyhow!("invalid log level '{}': {e}", self.log_level))
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub(crate) enum CliDisplayFormat {
    #[default]
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["socksnap"]);
        assert_eq!(cli.interval, 1_000_000);
        assert_eq!(cli.pipe_path, PathBuf::from("/tmp/socksnap.pipe"));
        assert_eq!(cli.log_level().unwrap(), LevelFilter::Info);
        assert!(!cli.print);
        assert!(!cli.foreground);
    }

    #[test]
    fn flags() {
        let cli = Cli::parse_from([
            "socksnap",
            "--interval",
            "500000",
            "--pipe_path",
            "/run/snap.pipe",
            "--print",
            "--format",
            "json",
            "--foreground",
        ]);
        assert_eq!(cli.interval, 500_000);
        assert_eq!(cli.pipe_path, PathBuf::from("/run/snap.pipe"));
        assert_eq!(cli.format, CliDisplayFormat::Json);
        assert!(cli.print && cli.foreground);
    }

    #[test]
    fn invalid_flags() {
        assert!(Cli::try_parse_from(["socksnap", "--interval", "fast"]).is_err());
        assert!(Cli::try_parse_from(["socksnap", "--log-level", "chatty"]).is_err());
        assert!(Cli::try_parse_from(["socksnap", "--no-such-flag"]).is_err());
    }
}
