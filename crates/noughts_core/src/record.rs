//! Move history and game outcome types.

use crate::Mark;
use serde::{Deserialize, Serialize};

/// Who made a move.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
pub enum Participant {
    /// The person at the keyboard.
    #[display("Human")]
    Human,
    /// The computer opponent.
    #[serde(rename = "CPU")]
    #[display("CPU")]
    Cpu,
}

impl Participant {
    /// Returns the other participant.
    pub fn other(self) -> Self {
        match self {
            Participant::Human => Participant::Cpu,
            Participant::Cpu => Participant::Human,
        }
    }
}

/// One move in a game's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Who played.
    pub player: Participant,
    /// The mark placed.
    pub mark: Mark,
    /// Cell index (0-8).
    pub position: usize,
}

impl MoveRecord {
    /// Creates a move record.
    pub fn new(player: Participant, mark: Mark, position: usize) -> Self {
        Self {
            player,
            mark,
            position,
        }
    }
}

impl std::fmt::Display for MoveRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): position {}", self.player, self.mark, self.position)
    }
}

/// How a finished game ended, from the point of view of move order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
pub enum Outcome {
    /// The player who moved first won.
    #[display("first player wins")]
    FirstPlayerWins,
    /// The player who moved second won.
    #[display("second player wins")]
    SecondPlayerWins,
    /// Nobody won.
    #[display("draw")]
    Draw,
}

impl Outcome {
    /// Derives the outcome from the winning mark. The first player always
    /// holds X.
    pub fn from_winner(winner: Option<Mark>) -> Self {
        match winner {
            Some(Mark::X) => Outcome::FirstPlayerWins,
            Some(Mark::O) => Outcome::SecondPlayerWins,
            None => Outcome::Draw,
        }
    }
}
