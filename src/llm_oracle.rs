//! Language-model oracle for CPU moves and post-game reflections.

use crate::config::{ConfigError, GameConfig};
use crate::llm_client::{LlmClient, LlmError, Sampling};
use async_trait::async_trait;
use noughts_core::{Cell, MoveOracle, MoveRecord, MoveRequest, OracleError, Outcome, SIDE};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const MOVE_SYSTEM_PROMPT: &str =
    "You are playing Tic-Tac-Toe. Answer with a single cell index and nothing else.";

const REFLECTION_SYSTEM_PROMPT: &str =
    "You are a friendly Tic-Tac-Toe commentator. Keep remarks short and light.";

/// Oracle backed by an [`LlmClient`].
#[derive(Debug, Clone)]
pub struct LlmOracle {
    client: LlmClient,
    move_sampling: Sampling,
    reflection_sampling: Sampling,
    timeout: Duration,
}

impl LlmOracle {
    /// Creates an oracle with explicit limits.
    pub fn new(
        client: LlmClient,
        move_sampling: Sampling,
        reflection_sampling: Sampling,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            move_sampling,
            reflection_sampling,
            timeout,
        }
    }

    /// Builds an oracle from the game config and environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the provider's API key is missing.
    #[instrument(skip(config))]
    pub fn from_config(config: &GameConfig) -> Result<Self, ConfigError> {
        Self::from_config_with(config, |var| std::env::var(var).ok())
    }

    /// Like [`from_config`](Self::from_config) with a custom variable
    /// lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `lookup` yields no API key.
    pub fn from_config_with(
        config: &GameConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let llm_config = config.create_llm_config_with(lookup)?;
        Ok(Self::new(
            LlmClient::new(llm_config),
            Sampling {
                max_tokens: *config.move_max_tokens(),
                temperature: 0.3,
            },
            Sampling {
                max_tokens: *config.reflection_max_tokens(),
                temperature: 0.7,
            },
            config.oracle_timeout(),
        ))
    }

    async fn ask(
        &self,
        request: impl Future<Output = Result<String, LlmError>>,
    ) -> Result<String, OracleError> {
        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(OracleError::Backend(e.message)),
            Err(_) => {
                warn!(timeout = ?self.timeout, "Oracle request timed out");
                Err(OracleError::Timeout)
            }
        }
    }
}

#[async_trait]
impl MoveOracle for LlmOracle {
    #[instrument(skip(self, request), fields(mark = %request.mark))]
    async fn suggest_move(&self, request: &MoveRequest) -> Result<usize, OracleError> {
        let prompt = move_prompt(request);
        let reply = self
            .ask(
                self.client
                    .generate(MOVE_SYSTEM_PROMPT, &prompt, self.move_sampling),
            )
            .await?;
        debug!(reply = %reply, "Oracle move reply");
        parse_move(&reply)
    }

    #[instrument(skip(self, moves), fields(move_count = moves.len()))]
    async fn suggest_reflection(
        &self,
        moves: &[MoveRecord],
        outcome: Outcome,
    ) -> Result<String, OracleError> {
        let prompt = reflection_prompt(moves, outcome);
        self.ask(self.client.generate(
            REFLECTION_SYSTEM_PROMPT,
            &prompt,
            self.reflection_sampling,
        ))
        .await
    }
}

/// Renders the board with free cells shown by their index.
pub fn board_text(cells: &[Cell]) -> String {
    cells
        .chunks(SIDE)
        .enumerate()
        .map(|(row, chunk)| {
            chunk
                .iter()
                .enumerate()
                .map(|(col, cell)| match cell.mark() {
                    Some(mark) => mark.to_string(),
                    None => (row * SIDE + col).to_string(),
                })
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .collect::<Vec<_>>()
        .join("\n---------\n")
}

/// Builds the move prompt.
pub fn move_prompt(request: &MoveRequest) -> String {
    format!(
        "You are playing Tic-Tac-Toe as '{}'.\n\
         Current board (numbers show empty cell indices):\n{}\n\
         Available moves: {:?}\n\
         Reply with ONLY a single number (the cell index) for your best move.",
        request.mark,
        board_text(&request.cells),
        request.empty_cells
    )
}

/// Builds the reflection prompt.
pub fn reflection_prompt(moves: &[MoveRecord], outcome: Outcome) -> String {
    let moves = moves
        .iter()
        .map(|m| format!("{}: position {}", m.player, m.position))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "A Tic-Tac-Toe game just ended.\nMoves:\n{}\nResult: {}\n\n\
         Give a brief, fun reflection on this game in 1-2 sentences.",
        moves, outcome
    )
}

/// Extracts the first integer in a reply ("I choose 4" -> 4).
///
/// # Errors
///
/// Returns [`OracleError::Malformed`] when the reply holds no usable number.
pub fn parse_move(reply: &str) -> Result<usize, OracleError> {
    let digits: String = reply
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits
        .parse()
        .map_err(|_| OracleError::Malformed(reply.to_string()))
}
