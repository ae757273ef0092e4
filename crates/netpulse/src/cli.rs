//! Clap derive structures for the `netpulse` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// netpulse -- cached network stats for a UniFi controller
#[derive(Debug, Parser)]
#[command(
    name = "netpulse",
    version,
    about = "Poll a UniFi controller and serve its stats as JSON",
    long_about = "Polls a UniFi controller on a fixed interval, keeps the latest\n\
        snapshot in memory, and serves it over HTTP with a live event stream.",
    propagate_version = true
)]
pub struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, short = 'c', env = "NETPULSE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Listen address (overrides `server.bind`)
    #[arg(long, short = 'b')]
    pub bind: Option<String>,

    /// Refresh interval in seconds (overrides `server.refresh_interval_secs`)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one refresh cycle against the configured controller and exit
    Check,
}
