//! Noughts - Unified CLI
//!
//! Console tic-tac-toe and a scripting helper for the CPU policy.

#![warn(missing_docs)]

mod cli;

use anyhow::{Result, bail};
use clap::Parser;
use cli::{Cli, Command};
use noughts::{GameConfig, PlayOptions, play};
use noughts_core::{Board, Cpu, Mark, Position, rules};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Play {
            config,
            first,
            log_dir,
            oracle,
            games,
            seed,
        } => {
            run_play(
                config,
                log_dir,
                oracle,
                PlayOptions { first, games, seed },
            )
            .await
        }
        Command::Suggest { board, mark, seed } => run_suggest(&board, mark, seed),
    }
}

/// Run the console game
#[instrument(skip(options))]
async fn run_play(
    config_path: PathBuf,
    log_dir: Option<PathBuf>,
    oracle: bool,
    options: PlayOptions,
) -> Result<()> {
    let mut config = GameConfig::load_or_default(&config_path)?;
    if let Some(dir) = log_dir {
        config = config.with_log_dir(dir);
    }
    if oracle {
        config = config.with_use_oracle(true);
    }

    info!(first = %options.first, use_oracle = *config.use_oracle(), "Starting console session");
    play(config, options).await
}

/// Print the rule-based move for a board
#[instrument]
fn run_suggest(board: &str, mark: Mark, seed: Option<u64>) -> Result<()> {
    let board: Board = board.parse()?;
    if rules::is_game_over(&board) {
        bail!("Game is already over:\n{}", board.display());
    }

    let mut cpu = Cpu::new(mark, mark.opponent());
    if let Some(seed) = seed {
        cpu = cpu.with_rng(StdRng::seed_from_u64(seed));
    }
    let index = cpu.rule_based_move(&board)?;
    match Position::from_index(index) {
        Some(position) => println!("{} ({})", index, position),
        None => println!("{}", index),
    }
    Ok(())
}
