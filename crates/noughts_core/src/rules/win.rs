//! Win detection logic for tic-tac-toe.

use crate::{Board, Cell, Mark};
use tracing::{instrument, trace};

/// Three cell indices that form a line.
pub type WinLine = [usize; 3];

/// Every line that wins the game: rows, then columns, then diagonals.
pub const WIN_PATTERNS: [WinLine; 8] = [
    // Rows
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    // Columns
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    // Diagonals
    [0, 4, 8],
    [2, 4, 6],
];

/// Returns the first completed line in [`WIN_PATTERNS`] order, if any.
#[instrument(skip(board))]
pub fn winning_line(board: &Board) -> Option<WinLine> {
    let line = WIN_PATTERNS.into_iter().find(|&[a, b, c]| {
        let first = board.cell(a);
        first != Cell::Empty && first == board.cell(b) && first == board.cell(c)
    });
    trace!(?line, "Checked win patterns");
    line
}

/// Returns the mark that completed a line, or `None` if nobody has won.
#[instrument(skip(board))]
pub fn check_winner(board: &Board) -> Option<Mark> {
    winning_line(board).and_then(|[first, _, _]| board.cell(first).mark())
}
