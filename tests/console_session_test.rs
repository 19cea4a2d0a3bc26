//! Scripted console sessions against the real driver.

use async_trait::async_trait;
use noughts::{FirstPlayer, GameConfig, GameRecord, PlayOptions, play_with};
use noughts_core::{MoveOracle, MoveRecord, MoveRequest, OracleError, Outcome};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Suggests the lowest free cell and numbers its remarks.
#[derive(Default)]
struct Scripted {
    fail_reflections: bool,
    reflections: AtomicUsize,
}

#[async_trait]
impl MoveOracle for Scripted {
    async fn suggest_move(&self, request: &MoveRequest) -> Result<usize, OracleError> {
        request
            .empty_cells
            .first()
            .copied()
            .ok_or(OracleError::Unavailable)
    }

    async fn suggest_reflection(
        &self,
        _moves: &[MoveRecord],
        _outcome: Outcome,
    ) -> Result<String, OracleError> {
        let n = self.reflections.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_reflections {
            Err(OracleError::Backend("connection refused".to_string()))
        } else {
            Ok(format!("remark #{}", n))
        }
    }
}

fn config(log_dir: &Path) -> GameConfig {
    GameConfig::default()
        .with_cpu_delay_ms(0)
        .with_log_dir(log_dir.to_path_buf())
}

/// Every cell in keypad order, repeated so each human turn eventually
/// finds a free cell.
fn sweep(rounds: usize) -> String {
    "1\n2\n3\n4\n5\n6\n7\n8\n9\n".repeat(rounds)
}

fn logged_games(dir: &Path) -> Vec<GameRecord> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "jsonl"))
        .flat_map(|path| {
            std::fs::read_to_string(path)
                .unwrap()
                .lines()
                .map(|line| serde_json::from_str::<GameRecord>(line).unwrap())
                .collect::<Vec<_>>()
        })
        .collect()
}

async fn run(config: GameConfig, options: PlayOptions, input: &str) -> String {
    run_with_oracle(config, options, None, input).await
}

async fn run_with_oracle(
    config: GameConfig,
    options: PlayOptions,
    oracle: Option<Arc<dyn MoveOracle>>,
    input: &str,
) -> String {
    let mut out = Vec::new();
    play_with(config, options, oracle, input.as_bytes(), &mut out)
        .await
        .unwrap();
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn test_quit_before_first_move() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(config(dir.path()), PlayOptions::default(), "q\n").await;

    assert!(output.contains("Your move: "));
    assert!(output.ends_with("Thanks for playing!\n"));
    assert!(logged_games(dir.path()).is_empty());
}

#[tokio::test]
async fn test_invalid_input_reprompts() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(config(dir.path()), PlayOptions::default(), "banana\nq\n").await;

    assert!(output.contains("Enter a number from 1 to 9, or q to quit."));
    assert_eq!(output.matches("Your move: ").count(), 2);
}

#[tokio::test]
async fn test_one_game_is_logged() {
    let dir = tempfile::tempdir().unwrap();
    let options = PlayOptions {
        first: FirstPlayer::Human,
        games: Some(1),
        seed: Some(5),
    };
    let output = run(config(dir.path()), options, &sweep(1)).await;

    assert!(output.contains("Recent games:"));
    assert!(output.contains("game #1: Human first"));

    let games = logged_games(dir.path());
    assert_eq!(games.len(), 1);
    let game = &games[0];
    assert_eq!(game.first_player, noughts_core::Participant::Human);
    assert_eq!(game.human_mark, noughts_core::Mark::X);
    assert!((5..=9).contains(&game.moves.len()));
    assert!(game.end_time >= game.start_time);
}

#[tokio::test]
async fn test_cpu_opens_every_game() {
    let dir = tempfile::tempdir().unwrap();
    let options = PlayOptions {
        first: FirstPlayer::Cpu,
        games: Some(2),
        seed: Some(9),
    };
    let output = run(config(dir.path()), options, &sweep(12)).await;

    assert!(output.contains("game #2: CPU first"));
    let games = logged_games(dir.path());
    assert_eq!(games.len(), 2);
    for game in &games {
        assert_eq!(game.cpu_mark, noughts_core::Mark::X);
        assert_eq!(game.moves[0].player, noughts_core::Participant::Cpu);
        // Empty board: the CPU opens in the center.
        assert_eq!(game.moves[0].position, 4);
    }
}

#[tokio::test]
async fn test_unwritable_log_dir_does_not_stop_play() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not_a_dir");
    std::fs::write(&blocker, "").unwrap();

    let options = PlayOptions {
        games: Some(1),
        seed: Some(1),
        ..PlayOptions::default()
    };
    let output = run(config(&blocker), options, &sweep(1)).await;

    assert!(output.contains("Warning: games will not be logged"));
    assert!(output.contains("Recent games:"));
}

#[tokio::test]
async fn test_declining_rematch_ends_session() {
    let dir = tempfile::tempdir().unwrap();
    let options = PlayOptions {
        seed: Some(2),
        ..PlayOptions::default()
    };
    // One sweep can leave unread lines, so the rematch answer is read from
    // whatever follows; a non-"y" line ends the session either way.
    let input = format!("{}n\n", sweep(1));
    let output = run(config(dir.path()), options, &input).await;

    assert!(output.contains("Play again? [y/N] "));
    assert_eq!(logged_games(dir.path()).len(), 1);
}

#[tokio::test]
async fn test_oracle_moves_are_played() {
    let dir = tempfile::tempdir().unwrap();
    let options = PlayOptions {
        first: FirstPlayer::Cpu,
        games: Some(1),
        seed: Some(3),
    };
    let oracle: Arc<dyn MoveOracle> = Arc::new(Scripted::default());
    run_with_oracle(config(dir.path()), options, Some(oracle), &sweep(5)).await;

    let games = logged_games(dir.path());
    // The rules would open in the center; the oracle picks the first free cell.
    assert_eq!(games[0].moves[0].position, 0);
}

#[tokio::test]
async fn test_reflection_shown_after_game() {
    let dir = tempfile::tempdir().unwrap();
    let options = PlayOptions {
        first: FirstPlayer::Human,
        games: Some(1),
        seed: Some(4),
    };
    let oracle: Arc<dyn MoveOracle> = Arc::new(Scripted::default());
    let output = run_with_oracle(config(dir.path()), options, Some(oracle), &sweep(5)).await;

    assert!(output.contains("\nReflection: remark #1\n"));
    assert!(output.ends_with("Thanks for playing!\n"));
}

#[tokio::test]
async fn test_reflection_for_earlier_game_not_shown() {
    let dir = tempfile::tempdir().unwrap();
    let options = PlayOptions {
        first: FirstPlayer::Human,
        games: Some(2),
        seed: Some(6),
    };
    let oracle: Arc<dyn MoveOracle> = Arc::new(Scripted::default());
    let output = run_with_oracle(config(dir.path()), options, Some(oracle), &sweep(12)).await;

    assert_eq!(output.matches("Reflection:").count(), 1);
    assert!(output.contains("Reflection: remark #2"));
    assert!(!output.contains("remark #1"));
}

#[tokio::test]
async fn test_failed_reflection_does_not_hold_up_session() {
    let dir = tempfile::tempdir().unwrap();
    let options = PlayOptions {
        first: FirstPlayer::Human,
        games: Some(1),
        seed: Some(8),
    };
    let oracle: Arc<dyn MoveOracle> = Arc::new(Scripted {
        fail_reflections: true,
        ..Scripted::default()
    });
    let config = config(dir.path()).with_oracle_timeout_secs(30);

    let started = Instant::now();
    let output = run_with_oracle(config, options, Some(oracle), &sweep(5)).await;

    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(!output.contains("Reflection:"));
    assert!(output.ends_with("Thanks for playing!\n"));
}

#[tokio::test]
async fn test_reflection_during_rematch_prompt_shown_once() {
    let dir = tempfile::tempdir().unwrap();
    let options = PlayOptions {
        first: FirstPlayer::Human,
        games: None,
        seed: Some(10),
    };
    let oracle: Arc<dyn MoveOracle> = Arc::new(Scripted::default());
    // Unread cells answer the rematch question as "no" too.
    let input = format!("{}n\n", sweep(2));
    let output = run_with_oracle(config(dir.path()), options, Some(oracle), &input).await;

    assert_eq!(logged_games(dir.path()).len(), 1);
    assert_eq!(output.matches("Reflection: remark #1").count(), 1);
}
