//! Whole games through the driver with a random opponent.

use noughts::{GameDriver, GameSummary, Turn, Winner};
use noughts_core::{Mark, Participant, rules};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

async fn random_game(
    driver: &mut GameDriver,
    first: Participant,
    rng: &mut StdRng,
) -> GameSummary {
    let mut turn = driver.start(first);
    loop {
        turn = match turn {
            Turn::HumanToMove => {
                let free = driver.board().empty_cells();
                let index = *free.choose(rng).unwrap();
                driver.human_move(index).unwrap()
            }
            Turn::CpuToMove => driver.cpu_move().await.unwrap(),
            Turn::Finished(summary) => return *summary,
        };
    }
}

#[tokio::test]
async fn test_random_games_finish_consistently() {
    let mut driver = GameDriver::new().with_seed(100);
    let mut rng = StdRng::seed_from_u64(100);

    for round in 0..60 {
        let first = if round % 2 == 0 {
            Participant::Human
        } else {
            Participant::Cpu
        };
        let summary = random_game(&mut driver, first, &mut rng).await;
        let record = &summary.record;

        assert!(!driver.is_active());
        assert_eq!(record.first_player, first);
        assert_eq!(record.moves[0].player, first);
        assert_eq!(record.moves[0].mark, Mark::X);

        // Players and marks alternate.
        for pair in record.moves.windows(2) {
            assert_ne!(pair[0].player, pair[1].player);
            assert_ne!(pair[0].mark, pair[1].mark);
        }

        let board = driver.board();
        match summary.winner {
            Winner::Draw => {
                assert!(rules::check_draw(board));
                assert_eq!(summary.winning_line, None);
            }
            Winner::Human => assert_eq!(rules::check_winner(board), Some(record.human_mark)),
            Winner::Cpu => assert_eq!(rules::check_winner(board), Some(record.cpu_mark)),
        }
        // The last mover made the winning line.
        if let Some(line) = summary.winning_line {
            let last = record.moves.last().unwrap();
            assert!(line.contains(&last.position));
        }
    }

    assert_eq!(driver.history().len(), 60);
    assert_eq!(driver.recent(10).len(), 10);
    assert_eq!(driver.recent(10)[9].game_id, driver.game_id());
}

#[tokio::test]
async fn test_cpu_never_misses_a_win_or_block() {
    let mut driver = GameDriver::new().with_seed(7);
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..40 {
        let mut turn = driver.start(Participant::Human);
        loop {
            turn = match turn {
                Turn::HumanToMove => {
                    let free = driver.board().empty_cells();
                    driver.human_move(*free.choose(&mut rng).unwrap()).unwrap()
                }
                Turn::CpuToMove => {
                    let before = *driver.board();
                    let own = noughts_core::find_winning_move(&before, Mark::O);
                    let threat = noughts_core::find_winning_move(&before, Mark::X);
                    let next = driver.cpu_move().await.unwrap();
                    let played = driver.moves().last().unwrap().position;
                    if let Some(win) = own {
                        assert_eq!(played, win);
                    } else if let Some(block) = threat {
                        assert_eq!(played, block);
                    }
                    next
                }
                Turn::Finished(_) => break,
            };
        }
    }
}
