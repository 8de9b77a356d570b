//! Strictly Gomoku - command-line entry point.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use strictly_gomoku_client::{
    ClientConfig, GameClient, HttpBootstrap, MemoryTransport, PlayerId, RoomId, replay,
};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Replay {
            transcript,
            room,
            player,
            bootstrap,
        } => run_replay(config, transcript, room, player, bootstrap).await,
        Command::Config => print_config(&config),
    }
}

fn load_config(path: Option<&Path>) -> Result<ClientConfig> {
    match path {
        Some(path) => ClientConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(ClientConfig::default()),
    }
}

/// Replays a transcript and prints the final board and verdict
#[instrument(skip(config))]
async fn run_replay(
    config: ClientConfig,
    transcript: PathBuf,
    room: String,
    player: String,
    bootstrap: bool,
) -> Result<()> {
    let api_base_url = config.api_base_url().clone();
    let client = GameClient::new(
        config,
        MemoryTransport::connected(),
        RoomId::new(room),
        PlayerId::new(player),
    );
    client.join().context("Failed to subscribe room topics")?;

    if bootstrap {
        client
            .bootstrap(&HttpBootstrap::new(api_base_url))
            .await
            .context("Bootstrap failed")?;
    }

    let file = std::fs::File::open(&transcript)
        .with_context(|| format!("Failed to open transcript {}", transcript.display()))?;
    let report = replay(&client, BufReader::new(file)).context("Failed to read transcript")?;
    info!(?report, "Replay finished");

    let state = client.state();
    let session = state.session();
    println!("{}", state.board().display());
    println!("status:   {}", session.status());
    match session.winner() {
        Some(outcome) => println!("verdict:  {}", outcome),
        None => println!("verdict:  none"),
    }
    if !session.winning_line().is_empty() {
        let line: Vec<String> = session.winning_line().iter().map(|c| c.to_string()).collect();
        println!("line:     {}", line.join(" "));
    }
    println!("turn:     {}", session.current_turn());
    println!(
        "frames:   {} applied, {} dropped; moves: {} sent, {} refused, {} expired",
        report.applied(),
        report.dropped(),
        report.submitted(),
        report.rejected(),
        report.expired()
    );
    Ok(())
}

/// Prints the effective configuration as TOML
fn print_config(config: &ClientConfig) -> Result<()> {
    let text = toml::to_string_pretty(config).context("Failed to render config")?;
    print!("{}", text);
    Ok(())
}
