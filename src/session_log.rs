//! Append-only session log: one JSON object per finished game.

use chrono::{DateTime, Local};
use derive_more::{Display, Error};
use noughts_core::{Mark, MoveRecord, Participant};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Who won, as written to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Winner {
    /// The human completed a line.
    #[display("Human")]
    Human,
    /// The CPU completed a line.
    #[serde(rename = "CPU")]
    #[display("CPU")]
    Cpu,
    /// Full board, no line.
    #[display("Draw")]
    Draw,
}

impl From<Participant> for Winner {
    fn from(participant: Participant) -> Self {
        match participant {
            Participant::Human => Winner::Human,
            Participant::Cpu => Winner::Cpu,
        }
    }
}

/// A finished game, one line of the session log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    /// When the game started.
    pub start_time: DateTime<Local>,
    /// When the game ended.
    pub end_time: DateTime<Local>,
    /// Who moved first (and played X).
    pub first_player: Participant,
    /// The human's mark.
    pub human_mark: Mark,
    /// The CPU's mark.
    pub cpu_mark: Mark,
    /// Moves in order.
    pub moves: Vec<MoveRecord>,
    /// Result.
    pub winner: Winner,
}

/// Session log file.
#[derive(Debug, Clone)]
pub struct SessionLog {
    path: PathBuf,
}

impl SessionLog {
    /// Creates the log directory if needed and names the file after the
    /// session start: `session_YYYYMMDD_HHMMSS.jsonl`.
    ///
    /// # Errors
    ///
    /// Returns [`LogError`] if the directory cannot be created.
    #[instrument(skip(dir), fields(dir = %dir.as_ref().display()))]
    pub fn create(dir: impl AsRef<Path>, session_start: DateTime<Local>) -> Result<Self, LogError> {
        fs::create_dir_all(dir.as_ref())?;
        let file_name = format!("session_{}.jsonl", session_start.format("%Y%m%d_%H%M%S"));
        let path = dir.as_ref().join(file_name);
        info!(path = %path.display(), "Session log ready");
        Ok(Self { path })
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record as a single line.
    ///
    /// # Errors
    ///
    /// Returns [`LogError`] on serialization or I/O failure.
    #[instrument(skip(self, record), fields(path = %self.path.display(), winner = %record.winner))]
    pub fn append(&self, record: &GameRecord) -> Result<(), LogError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        debug!(bytes = line.len(), "Game record appended");
        Ok(())
    }

    /// Reads every record written so far.
    ///
    /// # Errors
    ///
    /// Returns [`LogError`] on I/O failure or a malformed line.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read_all(&self) -> Result<Vec<GameRecord>, LogError> {
        let file = fs::File::open(&self.path)?;
        BufReader::new(file)
            .lines()
            .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
            .map(|line| -> Result<GameRecord, LogError> { Ok(serde_json::from_str(&line?)?) })
            .collect()
    }
}

/// Session log error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Log error: {} at {}:{}", message, file, line)]
pub struct LogError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl LogError {
    /// Creates a new log error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<std::io::Error> for LogError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        Self::new(format!("I/O error: {}", err))
    }
}

impl From<serde_json::Error> for LogError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("JSON error: {}", err))
    }
}
