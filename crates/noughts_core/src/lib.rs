//! Tic-tac-toe game state and decision engine.
//!
//! # Architecture
//!
//! - **Board**: the 9-cell grid, written only through [`Board::set_cell`]
//! - **Rules**: pure win/draw/game-over checks over a board
//! - **Cpu**: fixed-priority move policy with an optional [`MoveOracle`]
//!   consulted first
//!
//! # Example
//!
//! ```
//! use noughts_core::{Board, Cpu, Mark, rules};
//!
//! let mut board: Board = "XX..OO...".parse().unwrap();
//! let mut cpu = Cpu::new(Mark::X, Mark::O);
//! let index = cpu.rule_based_move(&board).unwrap();
//! assert_eq!(index, 2);
//! assert!(board.set_cell(index, Mark::X));
//! assert_eq!(rules::check_winner(&board), Some(Mark::X));
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod cpu;
mod oracle;
mod position;
mod record;
pub mod rules;
mod types;

pub use cpu::{CENTER, CORNERS, Cpu, CpuError, EDGES, Rule, find_winning_move};
pub use oracle::{MoveOracle, MoveRequest, NoOracle, OracleError, reflect};
pub use position::Position;
pub use record::{MoveRecord, Outcome, Participant};
pub use types::{Board, BoardParseError, CELL_COUNT, Cell, Mark, SIDE};
