//! Turn-taking state machine for one human against the CPU.
//!
//! The driver owns the board and the move history and never touches stdin,
//! stdout or the filesystem; front ends feed it moves and render the
//! [`Turn`] it hands back.

use crate::reflection::GameId;
use crate::session_log::{GameRecord, Winner};
use chrono::{DateTime, Local};
use derive_more::{Display, From};
use noughts_core::rules::{self, WinLine};
use noughts_core::{
    Board, Cpu, CpuError, Mark, MoveOracle, MoveRecord, NoOracle, Outcome, Participant,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// What the front end should do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    /// Waiting for the human's move.
    HumanToMove,
    /// Waiting for [`GameDriver::cpu_move`].
    CpuToMove,
    /// The game ended.
    Finished(Box<GameSummary>),
}

/// A finished game.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSummary {
    /// Which game of the session this was.
    pub game_id: GameId,
    /// Who won.
    pub winner: Winner,
    /// Completed line, for highlighting.
    pub winning_line: Option<WinLine>,
    /// Result by move order.
    pub outcome: Outcome,
    /// The record written to the session log.
    pub record: GameRecord,
}

impl std::fmt::Display for GameSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let result = match self.winner {
            Winner::Draw => "draw".to_string(),
            winner => format!("{} wins", winner),
        };
        write!(
            f,
            "{}: {} first, {} in {} moves",
            self.game_id,
            self.record.first_player,
            result,
            self.record.moves.len()
        )
    }
}

/// Driver misuse reported back to the front end.
#[derive(Debug, Clone, PartialEq, Eq, Display, From)]
pub enum DriverError {
    /// No game in progress.
    #[display("No game in progress")]
    NotActive,
    /// The other participant is to move.
    #[display("It is not {}'s turn", _0)]
    NotYourTurn(Participant),
    /// Cell is occupied or outside the board.
    #[display("Cell {} is not available", _0)]
    CellUnavailable(usize),
    /// The CPU could not move. The game is over.
    #[display("CPU failed: {}", _0)]
    #[from]
    Cpu(CpuError),
}

impl std::error::Error for DriverError {}

/// Runs games between the human and the CPU.
pub struct GameDriver {
    board: Board,
    moves: Vec<MoveRecord>,
    first_player: Participant,
    to_move: Participant,
    active: bool,
    game_id: GameId,
    start_time: DateTime<Local>,
    cpu: Option<Cpu>,
    oracle: Option<Arc<dyn MoveOracle>>,
    seed: Option<u64>,
    history: Vec<GameSummary>,
}

impl Default for GameDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl GameDriver {
    /// Creates an idle driver with a rule-only CPU.
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            moves: Vec::new(),
            first_player: Participant::Human,
            to_move: Participant::Human,
            active: false,
            game_id: GameId::default(),
            start_time: Local::now(),
            cpu: None,
            oracle: None,
            seed: None,
            history: Vec::new(),
        }
    }

    /// Lets each game's CPU consult `oracle` before its rules.
    pub fn with_oracle(mut self, oracle: Arc<dyn MoveOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Seeds the CPU's tie-breaks. Game `n` uses `seed + n`.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Starts a new game. Whoever moves first plays X.
    #[instrument(skip(self))]
    pub fn start(&mut self, first: Participant) -> Turn {
        self.board.reset();
        self.moves.clear();
        self.game_id = self.game_id.next();
        self.first_player = first;
        self.to_move = first;
        self.active = true;
        self.start_time = Local::now();

        let cpu_mark = self.mark_of(Participant::Cpu);
        let mut cpu = Cpu::new(cpu_mark, cpu_mark.opponent());
        if let Some(oracle) = &self.oracle {
            cpu = cpu.with_oracle(Arc::clone(oracle));
        }
        if let Some(seed) = self.seed {
            cpu = cpu.with_rng(StdRng::seed_from_u64(
                seed.wrapping_add(self.game_id.value()),
            ));
        }
        self.cpu = Some(cpu);

        info!(%first, human = %self.human_mark(), cpu = %cpu_mark, "Game started");
        self.pending_turn()
    }

    /// Applies the human's move.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] when no game is running, it is the CPU's
    /// turn, or the cell is not free.
    #[instrument(skip(self), fields(game = %self.game_id))]
    pub fn human_move(&mut self, index: usize) -> Result<Turn, DriverError> {
        self.check_turn(Participant::Human)?;
        self.place(Participant::Human, index)
    }

    /// Asks the CPU for its move and applies it.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Cpu`] if the engine fails; the game is then
    /// over and inactive.
    #[instrument(skip(self), fields(game = %self.game_id))]
    pub async fn cpu_move(&mut self) -> Result<Turn, DriverError> {
        self.check_turn(Participant::Cpu)?;
        let Some(cpu) = self.cpu.as_mut() else {
            return Err(DriverError::NotActive);
        };
        let index = match cpu.get_move(&self.board).await {
            Ok(index) => index,
            Err(e) => {
                error!(error = %e, "CPU could not move, ending game");
                self.active = false;
                return Err(e.into());
            }
        };
        self.place(Participant::Cpu, index)
    }

    /// Abandons the current game without recording it.
    pub fn reset(&mut self) {
        if self.active {
            warn!(game = %self.game_id, "Abandoning game in progress");
        }
        self.board.reset();
        self.moves.clear();
        self.active = false;
    }

    /// The current board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Moves of the current (or last) game.
    pub fn moves(&self) -> &[MoveRecord] {
        &self.moves
    }

    /// Id of the current (or last) game.
    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    /// Whether a game is in progress.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Who moves next while a game is active.
    pub fn to_move(&self) -> Participant {
        self.to_move
    }

    /// The human's mark in the current game.
    pub fn human_mark(&self) -> Mark {
        self.mark_of(Participant::Human)
    }

    /// The CPU's mark in the current game.
    pub fn cpu_mark(&self) -> Mark {
        self.mark_of(Participant::Cpu)
    }

    /// Whether an oracle was configured.
    pub fn has_oracle(&self) -> bool {
        self.oracle.is_some()
    }

    /// Oracle for reflections, [`NoOracle`] if none was configured.
    pub fn oracle(&self) -> Arc<dyn MoveOracle> {
        match &self.oracle {
            Some(oracle) => Arc::clone(oracle),
            None => Arc::new(NoOracle),
        }
    }

    /// Every finished game of the session, oldest first.
    pub fn history(&self) -> &[GameSummary] {
        &self.history
    }

    /// The last `n` finished games, oldest first.
    pub fn recent(&self, n: usize) -> &[GameSummary] {
        let skip = self.history.len().saturating_sub(n);
        &self.history[skip..]
    }

    fn mark_of(&self, participant: Participant) -> Mark {
        if participant == self.first_player {
            Mark::X
        } else {
            Mark::O
        }
    }

    fn participant_with(&self, mark: Mark) -> Participant {
        if mark == Mark::X {
            self.first_player
        } else {
            self.first_player.other()
        }
    }

    fn pending_turn(&self) -> Turn {
        match self.to_move {
            Participant::Human => Turn::HumanToMove,
            Participant::Cpu => Turn::CpuToMove,
        }
    }

    fn check_turn(&self, participant: Participant) -> Result<(), DriverError> {
        if !self.active {
            return Err(DriverError::NotActive);
        }
        if self.to_move != participant {
            return Err(DriverError::NotYourTurn(participant));
        }
        Ok(())
    }

    fn place(&mut self, player: Participant, index: usize) -> Result<Turn, DriverError> {
        let mark = self.mark_of(player);
        if !self.board.set_cell(index, mark) {
            debug!(index, "Cell unavailable");
            return Err(DriverError::CellUnavailable(index));
        }
        self.moves.push(MoveRecord::new(player, mark, index));
        debug!(%player, %mark, index, "Move applied");

        if rules::is_game_over(&self.board) {
            return Ok(Turn::Finished(Box::new(self.finish())));
        }
        self.to_move = player.other();
        Ok(self.pending_turn())
    }

    fn finish(&mut self) -> GameSummary {
        self.active = false;
        let winning_mark = rules::check_winner(&self.board);
        let winner = match winning_mark {
            Some(mark) => Winner::from(self.participant_with(mark)),
            None => Winner::Draw,
        };
        let record = GameRecord {
            start_time: self.start_time,
            end_time: Local::now(),
            first_player: self.first_player,
            human_mark: self.human_mark(),
            cpu_mark: self.cpu_mark(),
            moves: self.moves.clone(),
            winner,
        };
        let summary = GameSummary {
            game_id: self.game_id,
            winner,
            winning_line: rules::winning_line(&self.board),
            outcome: Outcome::from_winner(winning_mark),
            record,
        };
        info!(%winner, moves = self.moves.len(), "Game finished");
        self.history.push(summary.clone());
        summary
    }
}

impl std::fmt::Debug for GameDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameDriver")
            .field("board", &self.board)
            .field("game_id", &self.game_id)
            .field("active", &self.active)
            .field("to_move", &self.to_move)
            .field("cpu", &self.cpu)
            .field("games", &self.history.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished(turn: Turn) -> GameSummary {
        match turn {
            Turn::Finished(summary) => *summary,
            other => panic!("expected finished game, got {:?}", other),
        }
    }

    #[test]
    fn test_first_player_gets_x() {
        let mut driver = GameDriver::new().with_seed(1);
        assert_eq!(driver.start(Participant::Cpu), Turn::CpuToMove);
        assert_eq!(driver.cpu_mark(), Mark::X);
        assert_eq!(driver.human_mark(), Mark::O);

        assert_eq!(driver.start(Participant::Human), Turn::HumanToMove);
        assert_eq!(driver.human_mark(), Mark::X);
        assert_eq!(driver.game_id().value(), 2);
    }

    #[test]
    fn test_human_move_errors() {
        let mut driver = GameDriver::new();
        assert_eq!(driver.human_move(0), Err(DriverError::NotActive));

        driver.start(Participant::Human);
        assert_eq!(driver.human_move(9), Err(DriverError::CellUnavailable(9)));
        assert_eq!(driver.human_move(4), Ok(Turn::CpuToMove));
        assert_eq!(
            driver.human_move(0),
            Err(DriverError::NotYourTurn(Participant::Human))
        );
        assert_eq!(driver.moves().len(), 1);
    }

    #[tokio::test]
    async fn test_cpu_move_on_human_turn() {
        let mut driver = GameDriver::new();
        driver.start(Participant::Human);
        assert_eq!(
            driver.cpu_move().await,
            Err(DriverError::NotYourTurn(Participant::Cpu))
        );
    }

    #[tokio::test]
    async fn test_occupied_cell_keeps_turn() {
        let mut driver = GameDriver::new().with_seed(3);
        driver.start(Participant::Cpu);
        assert_eq!(driver.cpu_move().await, Ok(Turn::HumanToMove));
        // Empty board: the CPU takes the center.
        assert_eq!(driver.human_move(4), Err(DriverError::CellUnavailable(4)));
        assert_eq!(driver.to_move(), Participant::Human);
    }

    #[tokio::test]
    async fn test_full_game_reaches_finish() {
        let mut driver = GameDriver::new().with_seed(7);
        driver.start(Participant::Human);
        assert_eq!(driver.human_move(1), Ok(Turn::CpuToMove));
        let mut turn = driver.cpu_move().await.unwrap();
        assert_eq!(driver.board().cell(4).mark(), Some(Mark::O));

        while let Turn::HumanToMove | Turn::CpuToMove = turn {
            turn = match turn {
                Turn::HumanToMove => {
                    let free = driver.board().empty_cells();
                    // Always play the highest free cell, never blocking.
                    driver.human_move(*free.last().unwrap()).unwrap()
                }
                _ => driver.cpu_move().await.unwrap(),
            };
        }
        let summary = finished(turn);
        assert!(!driver.is_active());
        assert_eq!(summary.record.moves, driver.moves());
        assert_eq!(summary.record.first_player, Participant::Human);
        assert_eq!(summary.record.human_mark, Mark::X);
        if let Some(line) = summary.winning_line {
            let mark = driver.board().cell(line[0]).mark().unwrap();
            assert_eq!(Winner::from(driver.participant_with(mark)), summary.winner);
        } else {
            assert_eq!(summary.winner, Winner::Draw);
        }
        assert_eq!(driver.history().len(), 1);
    }

    #[tokio::test]
    async fn test_human_win_recorded() {
        let mut driver = GameDriver::new().with_seed(11);
        driver.start(Participant::Human);
        // Opposite corners around the CPU's center, then the free corner
        // forks two lines.
        driver.human_move(0).unwrap();
        driver.cpu_move().await.unwrap();
        driver.human_move(8).unwrap();
        driver.cpu_move().await.unwrap();

        let free = driver.board().empty_cells();
        let winning = noughts_core::find_winning_move(driver.board(), Mark::X);
        let target = match winning {
            Some(index) => index,
            None => {
                // The CPU took an edge; play the free fork corner.
                let corner = [2, 6]
                    .into_iter()
                    .find(|c| free.contains(c))
                    .unwrap();
                driver.human_move(corner).unwrap();
                driver.cpu_move().await.unwrap();
                noughts_core::find_winning_move(driver.board(), Mark::X).unwrap()
            }
        };
        let summary = finished(driver.human_move(target).unwrap());
        assert_eq!(summary.winner, Winner::Human);
        assert_eq!(summary.outcome, Outcome::FirstPlayerWins);
        assert!(summary.winning_line.unwrap().contains(&target));
    }

    #[tokio::test]
    async fn test_fatal_cpu_error_ends_game() {
        let mut driver = GameDriver::new();
        driver.start(Participant::Cpu);
        // Fill the board behind the driver's back.
        let full: Board = "XOXXOOOXX".parse().unwrap();
        driver.board = full;
        assert_eq!(
            driver.cpu_move().await,
            Err(DriverError::Cpu(CpuError::NoEmptyCells))
        );
        assert!(!driver.is_active());
        assert!(driver.history().is_empty());
    }

    #[test]
    fn test_recent_history() {
        let mut driver = GameDriver::new();
        for _ in 0..3 {
            driver.start(Participant::Human);
            let summary = driver.finish();
            assert_eq!(summary.winner, Winner::Draw);
        }
        assert_eq!(driver.recent(2).len(), 2);
        assert_eq!(driver.recent(2)[0].game_id.value(), 2);
        assert_eq!(driver.recent(10).len(), 3);
        assert_eq!(
            driver.recent(1)[0].to_string(),
            "game #3: Human first, draw in 0 moves"
        );
    }

    #[test]
    fn test_reset_abandons_game() {
        let mut driver = GameDriver::new();
        driver.start(Participant::Human);
        driver.human_move(0).unwrap();
        driver.reset();
        assert!(!driver.is_active());
        assert_eq!(driver.board().empty_cells().len(), 9);
        assert!(driver.history().is_empty());
    }
}
