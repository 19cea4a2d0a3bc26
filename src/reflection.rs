//! Background post-game reflections.
//!
//! Reflections run on their own task and may arrive late or never. Each note
//! carries the [`GameId`] it was requested for; the inbox drops notes for
//! any game other than the one the caller is showing.

use noughts_core::{MoveOracle, MoveRecord, Outcome, reflect};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, instrument};

/// Monotonically increasing per-session game number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, derive_more::Display,
)]
#[display("game #{}", _0)]
pub struct GameId(u64);

impl GameId {
    /// Returns the id of the following game.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Raw counter value.
    pub fn value(self) -> u64 {
        self.0
    }
}

/// The result of a reflection request for a specific game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectionNote {
    /// Game the reflection was requested for.
    pub game_id: GameId,
    /// The remark, `None` when the oracle produced nothing.
    pub text: Option<String>,
}

/// Receives reflections from background tasks.
#[derive(Debug)]
pub struct ReflectionInbox {
    tx: mpsc::UnboundedSender<ReflectionNote>,
    rx: mpsc::UnboundedReceiver<ReflectionNote>,
}

impl Default for ReflectionInbox {
    fn default() -> Self {
        Self::new()
    }
}

impl ReflectionInbox {
    /// Creates an empty inbox.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    /// Requests a reflection on a background task.
    ///
    /// Every request ends in exactly one note, failures included.
    #[instrument(skip(self, oracle, moves))]
    pub fn request(
        &self,
        oracle: Arc<dyn MoveOracle>,
        game_id: GameId,
        moves: Vec<MoveRecord>,
        outcome: Outcome,
    ) -> JoinHandle<()> {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let text = reflect(oracle, moves, outcome).await;
            if tx.send(ReflectionNote { game_id, text }).is_err() {
                debug!(%game_id, "Inbox closed before reflection arrived");
            }
        })
    }

    /// Returns the newest pending note for `current`, discarding notes for
    /// every other game. Does not wait.
    pub fn take_current(&mut self, current: GameId) -> Option<ReflectionNote> {
        let mut latest = None;
        while let Ok(note) = self.rx.try_recv() {
            latest = self.accept(note, current).or(latest);
        }
        latest
    }

    /// Waits up to `timeout` for the note for `current`, discarding stale
    /// notes as they arrive. Returns as soon as the request completes,
    /// whether or not it produced text.
    pub async fn wait_current(&mut self, current: GameId, timeout: Duration) -> Option<String> {
        if let Some(note) = self.take_current(current) {
            return note.text;
        }
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match tokio::time::timeout_at(deadline, self.rx.recv()).await {
                Ok(Some(note)) => {
                    if let Some(note) = self.accept(note, current) {
                        return note.text;
                    }
                }
                Ok(None) => return None,
                Err(_) => {
                    debug!(%current, ?timeout, "Reflection did not arrive in time");
                    return None;
                }
            }
        }
    }

    fn accept(&self, note: ReflectionNote, current: GameId) -> Option<ReflectionNote> {
        if note.game_id == current {
            Some(note)
        } else {
            debug!(stale = %note.game_id, %current, "Discarding stale reflection");
            None
        }
    }
}
