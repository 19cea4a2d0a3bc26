//! Line-oriented console front end.

use crate::config::GameConfig;
use crate::driver::{DriverError, GameDriver, GameSummary, Turn};
use crate::llm_oracle::LlmOracle;
use crate::reflection::{GameId, ReflectionInbox};
use crate::session_log::{SessionLog, Winner};
use chrono::Local;
use noughts_core::{MoveOracle, Participant, Position};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::{error, info, instrument, warn};

/// Number of games shown in the session summary.
pub const HISTORY_LEN: usize = 10;

/// Who moves first in each game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum FirstPlayer {
    /// The human always opens.
    Human,
    /// The CPU always opens.
    Cpu,
    /// Coin flip per game.
    #[default]
    Random,
}

impl FirstPlayer {
    /// Resolves the choice for one game.
    pub fn resolve(self, rng: &mut impl Rng) -> Participant {
        match self {
            FirstPlayer::Human => Participant::Human,
            FirstPlayer::Cpu => Participant::Cpu,
            FirstPlayer::Random => {
                if rng.gen_bool(0.5) {
                    Participant::Human
                } else {
                    Participant::Cpu
                }
            }
        }
    }
}

/// Session settings that do not come from the config file.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayOptions {
    /// Who opens each game.
    pub first: FirstPlayer,
    /// Stop after this many games instead of asking.
    pub games: Option<u32>,
    /// Seed for the CPU and the first-player coin.
    pub seed: Option<u64>,
}

/// One line of human input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// Leave the session.
    Quit,
    /// Play a cell index.
    Move(usize),
    /// Anything else.
    Invalid,
}

impl Input {
    /// Parses `q`/`quit`, a keypad number or a position label.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.eq_ignore_ascii_case("q") || line.eq_ignore_ascii_case("quit") {
            return Input::Quit;
        }
        match Position::from_keypad(line) {
            Some(position) => Input::Move(position.to_index()),
            None => Input::Invalid,
        }
    }
}

/// Plays on stdin and stdout until the human quits.
///
/// # Errors
///
/// Returns an error only when the terminal itself fails.
pub async fn play(config: GameConfig, options: PlayOptions) -> anyhow::Result<()> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    let oracle = resolve_oracle(&config, |var| std::env::var(var).ok(), &mut stdout)?;
    play_with(config, options, oracle, stdin, &mut stdout).await
}

/// Builds the LLM oracle when the config asks for one.
///
/// A missing API key is reported on `out` and the session continues by
/// rules only.
///
/// # Errors
///
/// Returns an error only when writing to `out` fails.
pub fn resolve_oracle(
    config: &GameConfig,
    lookup: impl Fn(&str) -> Option<String>,
    out: &mut impl Write,
) -> std::io::Result<Option<Arc<dyn MoveOracle>>> {
    if !*config.use_oracle() {
        return Ok(None);
    }
    match LlmOracle::from_config_with(config, lookup) {
        Ok(oracle) => {
            info!(model = config.model(), "LLM oracle enabled");
            let oracle: Arc<dyn MoveOracle> = Arc::new(oracle);
            Ok(Some(oracle))
        }
        Err(e) => {
            warn!(error = %e, "Oracle disabled, playing by rules only");
            writeln!(out, "LLM unavailable, the CPU plays by rules only.")?;
            Ok(None)
        }
    }
}

/// Plays against any line source and writer, with an optional oracle for
/// CPU moves and reflections.
///
/// # Errors
///
/// Returns an error when reading input or writing output fails.
#[instrument(skip(config, oracle, input, out))]
pub async fn play_with<R, W>(
    config: GameConfig,
    options: PlayOptions,
    oracle: Option<Arc<dyn MoveOracle>>,
    input: R,
    out: &mut W,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let log = match SessionLog::create(config.log_dir(), Local::now()) {
        Ok(log) => Some(log),
        Err(e) => {
            warn!(error = %e, "Session log disabled");
            writeln!(out, "Warning: games will not be logged ({})", e.message)?;
            None
        }
    };

    let mut driver = GameDriver::new();
    if let Some(seed) = options.seed {
        driver = driver.with_seed(seed);
    }
    if let Some(oracle) = oracle {
        driver = driver.with_oracle(oracle);
    }

    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut session = Session {
        config,
        driver,
        log,
        inbox: ReflectionInbox::new(),
        pending: None,
        lines: input.lines(),
    };

    writeln!(out, "Enter 1-9 (or a name like 'center') to move, q to quit.")?;
    let mut played = 0;
    loop {
        let first = options.first.resolve(&mut rng);
        match session.play_game(first, out).await? {
            Some(summary) => session.after_game(&summary, out)?,
            None => break,
        }
        played += 1;

        let more = match options.games {
            Some(limit) => played < limit,
            None => session.ask_again(out).await?,
        };
        if !more {
            break;
        }
    }

    session.last_reflection(out).await?;
    writeln!(out, "Thanks for playing!")?;
    info!(games = session.driver.history().len(), "Session ended");
    Ok(())
}

struct Session<R> {
    config: GameConfig,
    driver: GameDriver,
    log: Option<SessionLog>,
    inbox: ReflectionInbox,
    /// Game whose reflection may still be shown.
    pending: Option<GameId>,
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin> Session<R> {
    /// Runs one game. `None` means the human left or the game was aborted.
    async fn play_game(
        &mut self,
        first: Participant,
        out: &mut impl Write,
    ) -> anyhow::Result<Option<GameSummary>> {
        // A reflection for the previous game is stale once a new one starts.
        self.pending = None;
        let mut turn = self.driver.start(first);
        writeln!(
            out,
            "\n{}: {} moves first. You are {}.",
            self.driver.game_id(),
            first,
            self.driver.human_mark()
        )?;

        loop {
            turn = match turn {
                Turn::HumanToMove => {
                    writeln!(out, "\n{}", self.driver.board().display())?;
                    write!(out, "Your move: ")?;
                    out.flush()?;
                    let Some(line) = self.lines.next_line().await? else {
                        self.driver.reset();
                        return Ok(None);
                    };
                    match Input::parse(&line) {
                        Input::Quit => {
                            self.driver.reset();
                            return Ok(None);
                        }
                        Input::Move(index) => match self.driver.human_move(index) {
                            Ok(turn) => turn,
                            Err(DriverError::CellUnavailable(_)) => {
                                writeln!(out, "That square is taken. Try again.")?;
                                Turn::HumanToMove
                            }
                            Err(e) => return Err(e.into()),
                        },
                        Input::Invalid => {
                            writeln!(out, "Enter a number from 1 to 9, or q to quit.")?;
                            Turn::HumanToMove
                        }
                    }
                }
                Turn::CpuToMove => {
                    tokio::time::sleep(self.config.cpu_delay()).await;
                    match self.driver.cpu_move().await {
                        Ok(turn) => {
                            if let Some(position) = self
                                .driver
                                .moves()
                                .last()
                                .and_then(|m| Position::from_index(m.position))
                            {
                                writeln!(out, "CPU plays {}.", position)?;
                            }
                            turn
                        }
                        Err(e) => {
                            error!(error = %e, "Game aborted");
                            writeln!(out, "Game aborted: {}", e)?;
                            return Ok(None);
                        }
                    }
                }
                Turn::Finished(summary) => return Ok(Some(*summary)),
            };
        }
    }

    fn after_game(&mut self, summary: &GameSummary, out: &mut impl Write) -> anyhow::Result<()> {
        writeln!(out, "\n{}", self.driver.board().display())?;
        let headline = match summary.winner {
            Winner::Human => "You win!".to_string(),
            Winner::Cpu => "CPU wins!".to_string(),
            Winner::Draw => "It's a draw.".to_string(),
        };
        match summary.winning_line {
            Some(line) => {
                let cells: Vec<String> = line.iter().map(|i| (i + 1).to_string()).collect();
                writeln!(out, "{} ({})", headline, cells.join("-"))?;
            }
            None => writeln!(out, "{}", headline)?,
        }

        if let Some(log) = &self.log
            && let Err(e) = log.append(&summary.record)
        {
            warn!(error = %e, "Failed to write game record");
            writeln!(out, "Warning: could not save this game ({})", e.message)?;
        }

        if self.driver.has_oracle() {
            self.inbox.request(
                self.driver.oracle(),
                summary.game_id,
                summary.record.moves.clone(),
                summary.outcome,
            );
            self.pending = Some(summary.game_id);
        }

        writeln!(out, "\nRecent games:")?;
        for game in self.driver.recent(HISTORY_LEN) {
            writeln!(out, "  {}", game)?;
        }
        Ok(())
    }

    /// Asks for a rematch, printing the pending reflection if it arrives
    /// while the prompt is open.
    async fn ask_again(&mut self, out: &mut impl Write) -> anyhow::Result<bool> {
        const PROMPT: &str = "\nPlay again? [y/N] ";
        write!(out, "{}", PROMPT)?;
        out.flush()?;

        let timeout = self.config.oracle_timeout();
        let line = loop {
            let Some(game_id) = self.pending else {
                break self.lines.next_line().await?;
            };
            tokio::select! {
                line = self.lines.next_line() => break line?,
                text = self.inbox.wait_current(game_id, timeout) => {
                    self.pending = None;
                    if let Some(text) = text {
                        writeln!(out, "\nReflection: {}", text)?;
                        write!(out, "{}", PROMPT)?;
                        out.flush()?;
                    }
                }
            }
        };
        let answer = line.unwrap_or_default();
        Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
    }

    /// Gives the last game's reflection a bounded chance to arrive before
    /// the session ends.
    async fn last_reflection(&mut self, out: &mut impl Write) -> anyhow::Result<()> {
        let Some(game_id) = self.pending.take() else {
            return Ok(());
        };
        if let Some(text) = self
            .inbox
            .wait_current(game_id, self.config.oracle_timeout())
            .await
        {
            writeln!(out, "\nReflection: {}", text)?;
        }
        Ok(())
    }
}
