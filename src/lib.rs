//! Noughts - console tic-tac-toe against a rule-based CPU
//!
//! The board, judge and CPU live in [`noughts_core`]; this crate adds
//! everything around a play session.
//!
//! # Architecture
//!
//! - **Driver**: I/O-free turn-taking state machine
//! - **Console**: stdin/stdout front end over the driver
//! - **Oracle**: optional language-model move and reflection source
//! - **Session log**: one JSON line per finished game
//!
//! # Example
//!
//! ```no_run
//! use noughts::{GameDriver, Turn};
//! use noughts_core::Participant;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut driver = GameDriver::new().with_seed(42);
//! let mut turn = driver.start(Participant::Cpu);
//! while let Turn::CpuToMove = turn {
//!     turn = driver.cpu_move().await?;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod console;
mod driver;
mod llm_client;
mod llm_oracle;
mod reflection;
mod session_log;

// Crate-level exports - Configuration
pub use config::{ConfigError, GameConfig};

// Crate-level exports - Console front end
pub use console::{
    FirstPlayer, HISTORY_LEN, Input, PlayOptions, play, play_with, resolve_oracle,
};

// Crate-level exports - Game driver
pub use driver::{DriverError, GameDriver, GameSummary, Turn};

// Crate-level exports - LLM client and oracle
pub use llm_client::{LlmClient, LlmConfig, LlmError, LlmProvider, Sampling};
pub use llm_oracle::{LlmOracle, board_text, move_prompt, parse_move, reflection_prompt};

// Crate-level exports - Reflections
pub use reflection::{GameId, ReflectionInbox, ReflectionNote};

// Crate-level exports - Session log
pub use session_log::{GameRecord, LogError, SessionLog, Winner};
