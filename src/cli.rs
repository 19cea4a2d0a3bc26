//! Command-line interface for noughts.

use clap::{Parser, Subcommand};
use noughts::FirstPlayer;
use noughts_core::Mark;
use std::path::PathBuf;

/// Noughts - tic-tac-toe against a rule-based CPU
#[derive(Parser, Debug)]
#[command(name = "noughts")]
#[command(about = "Play tic-tac-toe against the computer", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play in the terminal
    Play {
        /// Path to game configuration file
        #[arg(short, long, default_value = "noughts.toml")]
        config: PathBuf,

        /// Who moves first (coin flip per game by default)
        #[arg(long, value_enum, default_value_t = FirstPlayer::Random)]
        first: FirstPlayer,

        /// Override the session log directory
        #[arg(long)]
        log_dir: Option<PathBuf>,

        /// Ask the language model for CPU moves
        #[arg(long)]
        oracle: bool,

        /// Stop after this many games
        #[arg(long)]
        games: Option<u32>,

        /// Seed the CPU's random tie-breaks
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print the rule-based move for a board
    Suggest {
        /// Nine cells, row by row: X, O or '.' (slashes allowed, e.g. "XX./OO./...")
        board: String,

        /// Mark to move
        #[arg(short, long)]
        mark: Mark,

        /// Seed the random tie-breaks
        #[arg(long)]
        seed: Option<u64>,
    },
}
