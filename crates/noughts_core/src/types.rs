//! Core domain types for tic-tac-toe.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, instrument};

/// Number of cells on the board.
pub const CELL_COUNT: usize = 9;

/// Side length of the board.
pub const SIDE: usize = 3;

/// A player's mark.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Mark {
    /// Mark X (moves first).
    X,
    /// Mark O (moves second).
    O,
}

impl Mark {
    /// Returns the opposing mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

/// A cell on the tic-tac-toe board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    /// Nobody has played here.
    #[default]
    Empty,
    /// Cell holds a mark.
    Occupied(Mark),
}

impl Cell {
    /// Returns true for an empty cell.
    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }

    /// Returns the mark in this cell, if any.
    pub fn mark(self) -> Option<Mark> {
        match self {
            Cell::Empty => None,
            Cell::Occupied(mark) => Some(mark),
        }
    }
}

/// 3x3 tic-tac-toe board.
///
/// Cells are stored in row-major order:
///
/// ```text
/// 0 | 1 | 2
/// 3 | 4 | 5
/// 6 | 7 | 8
/// ```
///
/// The only way to write a cell is [`Board::set_cell`], which refuses
/// out-of-range indices and occupied cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Board {
    cells: [Cell; CELL_COUNT],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self {
            cells: [Cell::Empty; CELL_COUNT],
        }
    }

    /// Creates a board from explicit cell values.
    pub fn from_cells(cells: [Cell; CELL_COUNT]) -> Self {
        Self { cells }
    }

    /// Clears every cell.
    #[instrument(skip(self))]
    pub fn reset(&mut self) {
        debug!("Resetting board");
        self.cells = [Cell::Empty; CELL_COUNT];
    }

    /// Returns the cell at `index`, or [`Cell::Empty`] when out of range.
    pub fn cell(&self, index: usize) -> Cell {
        self.cells.get(index).copied().unwrap_or(Cell::Empty)
    }

    /// Places `mark` at `index`.
    ///
    /// Returns `false` without touching the board if the index is out of
    /// range or the cell is already occupied.
    #[instrument(skip(self))]
    pub fn set_cell(&mut self, index: usize, mark: Mark) -> bool {
        match self.cells.get_mut(index) {
            Some(cell) if cell.is_empty() => {
                *cell = Cell::Occupied(mark);
                true
            }
            Some(_) => {
                debug!(index, "Cell already occupied");
                false
            }
            None => {
                debug!(index, "Cell index out of range");
                false
            }
        }
    }

    /// Returns the indices of all empty cells in ascending order.
    pub fn empty_cells(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_empty())
            .map(|(index, _)| index)
            .collect()
    }

    /// Returns true if no cell is empty.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| !cell.is_empty())
    }

    /// Returns a copy of all cells.
    ///
    /// The array is returned by value, so changes to it never reach the board.
    pub fn state(&self) -> [Cell; CELL_COUNT] {
        self.cells
    }

    /// Converts a cell index to `(row, col)`.
    pub fn cell_position(index: usize) -> (usize, usize) {
        (index / SIDE, index % SIDE)
    }

    /// Converts `(row, col)` to a cell index.
    pub fn cell_index(row: usize, col: usize) -> usize {
        row * SIDE + col
    }

    /// Formats the board as a human-readable string.
    ///
    /// Empty cells show their keypad number (1-9).
    pub fn display(&self) -> String {
        let mut result = String::new();
        for row in 0..SIDE {
            for col in 0..SIDE {
                let index = Self::cell_index(row, col);
                let symbol = match self.cells[index] {
                    Cell::Empty => (index + 1).to_string(),
                    Cell::Occupied(mark) => mark.to_string(),
                };
                result.push_str(&symbol);
                if col < SIDE - 1 {
                    result.push('|');
                }
            }
            if row < SIDE - 1 {
                result.push_str("\n-+-+-\n");
            }
        }
        result
    }
}

/// Error parsing a board from text.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum BoardParseError {
    /// Wrong number of cells.
    #[display("Expected 9 cells, found {}", _0)]
    WrongLength(usize),

    /// Unrecognised cell character.
    #[display("Invalid cell character {:?}", _0)]
    InvalidCell(char),
}

impl std::error::Error for BoardParseError {}

impl FromStr for Board {
    type Err = BoardParseError;

    /// Parses nine cells written as `X`, `O`, or one of `.`, `-`, `_`, ` `
    /// for empty. `/` and newlines may separate rows and are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cells = s
            .chars()
            .filter(|c| !matches!(c, '/' | '\n' | '\r'))
            .map(|c| match c {
                'X' | 'x' => Ok(Cell::Occupied(Mark::X)),
                'O' | 'o' => Ok(Cell::Occupied(Mark::O)),
                '.' | '-' | '_' | ' ' => Ok(Cell::Empty),
                other => Err(BoardParseError::InvalidCell(other)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let cells: [Cell; CELL_COUNT] = cells
            .try_into()
            .map_err(|v: Vec<Cell>| BoardParseError::WrongLength(v.len()))?;
        Ok(Self::from_cells(cells))
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_board_is_empty() {
        let board = Board::new();
        assert_eq!(board.empty_cells(), (0..9).collect::<Vec<_>>());
        assert!(!board.is_full());
    }

    #[test]
    fn test_set_cell_rejects_occupied() {
        let mut board = Board::new();
        assert!(board.set_cell(4, Mark::X));
        let before = board.state();
        assert!(!board.set_cell(4, Mark::O));
        assert_eq!(board.state(), before);
        assert_eq!(board.cell(4), Cell::Occupied(Mark::X));
    }

    #[test]
    fn test_set_cell_rejects_out_of_range() {
        let mut board = Board::new();
        assert!(!board.set_cell(9, Mark::X));
        assert!(!board.set_cell(usize::MAX, Mark::O));
        assert_eq!(board, Board::new());
    }

    #[test]
    fn test_cell_out_of_range_is_empty() {
        let mut board = Board::new();
        for i in 0..9 {
            board.set_cell(i, Mark::O);
        }
        assert_eq!(board.cell(9), Cell::Empty);
        assert_eq!(board.cell(100), Cell::Empty);
    }

    #[test]
    fn test_state_is_a_copy() {
        let board = Board::new();
        let mut snapshot = board.state();
        snapshot[0] = Cell::Occupied(Mark::X);
        assert_eq!(board.cell(0), Cell::Empty);
    }

    #[test]
    fn test_reset_clears_cells() {
        let mut board: Board = "XOX/OXO/...".parse().unwrap();
        board.reset();
        assert_eq!(board, Board::new());
    }

    #[test]
    fn test_coordinate_round_trip() {
        for i in 0..9 {
            let (row, col) = Board::cell_position(i);
            assert!(row < 3 && col < 3);
            assert_eq!(Board::cell_index(row, col), i);
        }
        assert_eq!(Board::cell_position(5), (1, 2));
        assert_eq!(Board::cell_index(2, 0), 6);
    }

    #[test]
    fn test_parse_board() {
        let board: Board = "XX..OO...".parse().unwrap();
        assert_eq!(board.cell(0), Cell::Occupied(Mark::X));
        assert_eq!(board.cell(4), Cell::Occupied(Mark::O));
        assert_eq!(board.empty_cells(), vec![2, 3, 6, 7, 8]);
    }

    #[test]
    fn test_parse_board_errors() {
        assert_eq!(
            "XX".parse::<Board>(),
            Err(BoardParseError::WrongLength(2))
        );
        assert_eq!(
            "XX..OO..Z".parse::<Board>(),
            Err(BoardParseError::InvalidCell('Z'))
        );
    }

    #[test]
    fn test_display() {
        let board: Board = "X...O....".parse().unwrap();
        assert_eq!(board.display(), "X|2|3\n-+-+-\n4|O|6\n-+-+-\n7|8|9");
    }

    #[test]
    fn test_mark_parse_and_opponent() {
        assert_eq!("x".parse::<Mark>().unwrap(), Mark::X);
        assert_eq!("O".parse::<Mark>().unwrap(), Mark::O);
        assert_eq!(Mark::X.opponent(), Mark::O);
        assert_eq!(Mark::O.to_string(), "O");
    }
}
