//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser};

use crate::commands::Command;

/// Sign in to an infograph backend and exercise the session from a terminal.
#[derive(Parser, Debug)]
#[command(name = "infograph")]
#[command(author, version = env!("INFOGRAPH_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Settings shared by every command.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Backend base URL [default: http://localhost:8000]
    #[arg(long, env = "INFOGRAPH_API_BASE", global = true)]
    pub api_base: Option<String>,

    /// Session file [default: <data dir>/infograph/session.json]
    #[arg(long, env = "INFOGRAPH_STORE", global = true)]
    pub store: Option<PathBuf>,

    /// Per-request timeout in seconds [default: 10]
    #[arg(long, env = "INFOGRAPH_TIMEOUT_SECS", global = true)]
    pub timeout_secs: Option<u64>,
}
