//! Draw and game-over detection for tic-tac-toe.

use super::win::winning_line;
use crate::Board;
use tracing::instrument;

/// A draw is a full board with no completed line.
#[instrument(skip(board))]
pub fn check_draw(board: &Board) -> bool {
    board.is_full() && winning_line(board).is_none()
}

/// The game is over once a line is complete or the board is full.
#[instrument(skip(board))]
pub fn is_game_over(board: &Board) -> bool {
    winning_line(board).is_some() || board.is_full()
}
