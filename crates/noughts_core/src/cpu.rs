//! Rule-based computer opponent with an optional oracle in front.
//!
//! The CPU decides in this order, first match wins:
//!
//! 1. the oracle's suggestion, if enabled and the cell is free
//! 2. complete its own line
//! 3. block the opponent's line
//! 4. take the center
//! 5. take a random free corner
//! 6. take a random free edge
//! 7. take any random free cell

use crate::oracle::{MoveOracle, MoveRequest, NoOracle, OracleError};
use crate::rules::WIN_PATTERNS;
use crate::{Board, Cell, Mark};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Center cell index.
pub const CENTER: usize = 4;

/// Corner cell indices.
pub const CORNERS: [usize; 4] = [0, 2, 6, 8];

/// Edge cell indices (outer ring, not corners).
pub const EDGES: [usize; 4] = [1, 3, 5, 7];

/// One step of the fallback policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Rule {
    /// Complete a line of our own.
    #[display("win")]
    WinNow,
    /// Fill the cell the opponent needs to complete a line.
    #[display("block")]
    Block,
    /// Take the center.
    #[display("center")]
    Center,
    /// Take a random free corner.
    #[display("corner")]
    Corner,
    /// Take a random free edge.
    #[display("edge")]
    Edge,
    /// Take any random free cell.
    #[display("any")]
    AnyEmpty,
}

impl Rule {
    /// Rules in the order they are tried.
    pub const POLICY: [Rule; 6] = [
        Rule::WinNow,
        Rule::Block,
        Rule::Center,
        Rule::Corner,
        Rule::Edge,
        Rule::AnyEmpty,
    ];
}

/// The CPU could not produce a move.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum CpuError {
    /// Asked to move on a board with no free cell. The driver must check
    /// for game over before handing the turn to the CPU.
    #[display("No empty cells: the CPU was asked to move after the game ended")]
    NoEmptyCells,
}

impl std::error::Error for CpuError {}

/// Finds the free cell that would complete a line for `mark`.
///
/// Scans [`WIN_PATTERNS`] in order and returns the first line holding two
/// `mark` cells and one empty cell.
#[instrument(skip(board))]
pub fn find_winning_move(board: &Board, mark: Mark) -> Option<usize> {
    WIN_PATTERNS.iter().find_map(|pattern| {
        let own = pattern
            .iter()
            .filter(|&&i| board.cell(i) == Cell::Occupied(mark))
            .count();
        let mut empty = pattern.iter().copied().filter(|&i| board.cell(i).is_empty());
        match (own, empty.next(), empty.next()) {
            (2, Some(index), None) => Some(index),
            _ => None,
        }
    })
}

/// Computer opponent.
pub struct Cpu {
    mark: Mark,
    opponent: Mark,
    use_oracle: bool,
    oracle: Arc<dyn MoveOracle>,
    rng: Box<dyn RngCore + Send>,
}

impl Cpu {
    /// Creates a rule-only CPU playing `mark` against `opponent`.
    #[instrument]
    pub fn new(mark: Mark, opponent: Mark) -> Self {
        Self {
            mark,
            opponent,
            use_oracle: false,
            oracle: Arc::new(NoOracle),
            rng: Box::new(StdRng::from_entropy()),
        }
    }

    /// Enables the oracle path with the given oracle.
    pub fn with_oracle(mut self, oracle: Arc<dyn MoveOracle>) -> Self {
        info!(mark = %self.mark, "Oracle enabled for CPU");
        self.use_oracle = true;
        self.oracle = oracle;
        self
    }

    /// Replaces the random source used for corner, edge and fallback picks.
    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    /// The CPU's mark.
    pub fn mark(&self) -> Mark {
        self.mark
    }

    /// The opponent's mark.
    pub fn opponent(&self) -> Mark {
        self.opponent
    }

    /// Whether moves are first requested from the oracle.
    pub fn uses_oracle(&self) -> bool {
        self.use_oracle
    }

    /// Shared handle to the oracle, for post-game reflections.
    pub fn oracle(&self) -> Arc<dyn MoveOracle> {
        Arc::clone(&self.oracle)
    }

    /// Chooses the CPU's next move. The board is not modified.
    ///
    /// # Errors
    ///
    /// Returns [`CpuError::NoEmptyCells`] if the board is full.
    #[instrument(skip(self, board), fields(mark = %self.mark, use_oracle = self.use_oracle))]
    pub async fn get_move(&mut self, board: &Board) -> Result<usize, CpuError> {
        let request = MoveRequest::new(board, self.mark);
        if request.empty_cells.is_empty() {
            error!("CPU asked to move on a full board");
            return Err(CpuError::NoEmptyCells);
        }

        if self.use_oracle {
            match self.oracle.suggest_move(&request).await {
                Ok(index) if request.accepts(index) => {
                    info!(index, "Using oracle move");
                    return Ok(index);
                }
                Ok(index) => {
                    warn!(index, "Oracle suggested an unavailable cell, falling back");
                }
                Err(OracleError::Unavailable) => {
                    debug!("Oracle unavailable, falling back");
                }
                Err(e) => {
                    warn!(error = %e, "Oracle failed, falling back");
                }
            }
        }

        self.rule_based_move(board)
    }

    /// Chooses a move using only the fixed rule policy.
    ///
    /// # Errors
    ///
    /// Returns [`CpuError::NoEmptyCells`] if the board is full.
    #[instrument(skip(self, board), fields(mark = %self.mark))]
    pub fn rule_based_move(&mut self, board: &Board) -> Result<usize, CpuError> {
        for rule in Rule::POLICY {
            if let Some(index) = self.apply_rule(rule, board) {
                debug!(%rule, index, "Rule selected move");
                return Ok(index);
            }
        }
        error!("No rule produced a move");
        Err(CpuError::NoEmptyCells)
    }

    /// Evaluates a single rule. Returns `None` if the rule does not apply.
    pub fn apply_rule(&mut self, rule: Rule, board: &Board) -> Option<usize> {
        match rule {
            Rule::WinNow => find_winning_move(board, self.mark),
            Rule::Block => find_winning_move(board, self.opponent),
            Rule::Center => board.cell(CENTER).is_empty().then_some(CENTER),
            Rule::Corner => self.pick_free(board, &CORNERS),
            Rule::Edge => self.pick_free(board, &EDGES),
            Rule::AnyEmpty => self.pick(&board.empty_cells()),
        }
    }

    fn pick_free(&mut self, board: &Board, candidates: &[usize]) -> Option<usize> {
        let free: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&i| board.cell(i).is_empty())
            .collect();
        self.pick(&free)
    }

    fn pick(&mut self, candidates: &[usize]) -> Option<usize> {
        candidates.choose(&mut *self.rng).copied()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("mark", &self.mark)
            .field("opponent", &self.opponent)
            .field("use_oracle", &self.use_oracle)
            .finish_non_exhaustive()
    }
}
