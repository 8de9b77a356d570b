//! Command-line interface for strictly_gomoku.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Strictly Gomoku - optimistic five-in-a-row session engine
#[derive(Parser, Debug)]
#[command(name = "strictly_gomoku")]
#[command(about = "Client session engine for real-time five-in-a-row", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to client configuration (TOML). Defaults apply when omitted.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a JSON-lines transcript through a session and print the result
    Replay {
        /// Transcript file
        transcript: PathBuf,

        /// Room id
        #[arg(long, default_value = "1")]
        room: String,

        /// Local player id
        #[arg(long, default_value = "1")]
        player: String,

        /// Load the initial board and symbol from the HTTP API first
        #[arg(long)]
        bootstrap: bool,
    },

    /// Print the effective configuration
    Config,
}
