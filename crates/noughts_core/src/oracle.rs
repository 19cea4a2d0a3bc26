//! External move and reflection suggesters.
//!
//! The CPU can ask an oracle (usually a language model) for a move before
//! falling back to its own rules. Oracles are allowed to fail in any way they
//! like; callers treat every error as "no suggestion".

use crate::{Board, CELL_COUNT, Cell, Mark, MoveRecord, Outcome};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// What the oracle is asked when the CPU wants a move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    /// Snapshot of the board.
    pub cells: [Cell; CELL_COUNT],
    /// The mark the suggestion is for.
    pub mark: Mark,
    /// Indices that are still free.
    pub empty_cells: Vec<usize>,
}

impl MoveRequest {
    /// Builds a request from the current board.
    pub fn new(board: &Board, mark: Mark) -> Self {
        Self {
            cells: board.state(),
            mark,
            empty_cells: board.empty_cells(),
        }
    }

    /// Returns true if `index` is one of the free cells.
    pub fn accepts(&self, index: usize) -> bool {
        self.empty_cells.contains(&index)
    }
}

/// Why an oracle produced nothing usable.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum OracleError {
    /// No oracle is configured, or credentials are missing.
    #[display("Oracle unavailable")]
    Unavailable,

    /// The backend call failed.
    #[display("Oracle backend failed: {}", _0)]
    Backend(String),

    /// The reply could not be interpreted.
    #[display("Malformed oracle reply: {:?}", _0)]
    Malformed(String),

    /// The backend did not answer in time.
    #[display("Oracle timed out")]
    Timeout,
}

impl std::error::Error for OracleError {}

/// Something that can suggest moves and comment on finished games.
#[async_trait]
pub trait MoveOracle: Send + Sync {
    /// Suggests a cell index for `request.mark`.
    ///
    /// Implementations need not validate the index; the CPU checks it
    /// against `request.empty_cells`.
    async fn suggest_move(&self, request: &MoveRequest) -> Result<usize, OracleError>;

    /// Produces a short remark about a finished game.
    async fn suggest_reflection(
        &self,
        moves: &[MoveRecord],
        outcome: Outcome,
    ) -> Result<String, OracleError>;
}

/// Oracle that never answers. Used when no model is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOracle;

#[async_trait]
impl MoveOracle for NoOracle {
    async fn suggest_move(&self, _request: &MoveRequest) -> Result<usize, OracleError> {
        Err(OracleError::Unavailable)
    }

    async fn suggest_reflection(
        &self,
        _moves: &[MoveRecord],
        _outcome: Outcome,
    ) -> Result<String, OracleError> {
        Err(OracleError::Unavailable)
    }
}

/// Asks `oracle` for a post-game remark.
///
/// Returns `None` on any failure, including an empty reply.
#[instrument(skip(oracle, moves), fields(move_count = moves.len()))]
pub async fn reflect(
    oracle: Arc<dyn MoveOracle>,
    moves: Vec<MoveRecord>,
    outcome: Outcome,
) -> Option<String> {
    match oracle.suggest_reflection(&moves, outcome).await {
        Ok(text) => {
            let text = text.trim();
            if text.is_empty() {
                debug!("Oracle returned an empty reflection");
                None
            } else {
                info!(length = text.len(), "Received reflection");
                Some(text.to_string())
            }
        }
        Err(OracleError::Unavailable) => {
            debug!("No oracle available for reflection");
            None
        }
        Err(e) => {
            warn!(error = %e, "Reflection failed");
            None
        }
    }
}
