//! Game rules for tic-tac-toe.
//!
//! Pure functions over a [`Board`](crate::Board). Nothing here mutates the
//! board; the driver calls these after every move to decide whether the game
//! is over.

pub mod draw;
pub mod win;

pub use draw::{check_draw, is_game_over};
pub use win::{WIN_PATTERNS, WinLine, check_winner, winning_line};
