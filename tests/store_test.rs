/// The SQLite corpus behind the full trainer flow.

mod common;

use chess_puzzler::{
    Difficulty, GamePhase, MemoryProgressStore, MoveResult, PuzzleStore, SelectionCriteria,
    Trainer,
};
use common::*;
use puzzle_store::SqlitePuzzleStore;

fn corpus() -> SqlitePuzzleStore {
    let mut store = SqlitePuzzleStore::open_in_memory().unwrap();
    for puzzle in [
        open_e4_e5(),
        castle_line(),
        promotion_line(),
        knight_pair_line(),
        catalog_puzzle("opening_trap", 1250, 30, &["trap", "fork"]),
    ] {
        store.insert_puzzle(&puzzle).unwrap();
    }
    store
}

#[test]
fn test_file_backed_store_reopens() {
    let path = temp_file("puzzles.db");
    {
        let mut store = SqlitePuzzleStore::open(&path).unwrap();
        store.insert_puzzle(&castle_line()).unwrap();
    }
    let store = SqlitePuzzleStore::open(&path).unwrap();
    let puzzle = store.find_by_id("castle").unwrap().unwrap();
    assert_eq!(puzzle, castle_line());
    std::fs::remove_dir_all(path.parent().unwrap()).ok();
}

#[test]
fn test_endgame_promotion_selected_and_solved() {
    let mut trainer = Trainer::with_seed(corpus(), MemoryProgressStore::new(), 9);
    let criteria = SelectionCriteria::new(Difficulty::Intermediate)
        .phase(Some(GamePhase::Endgame))
        .theme("promotion");

    let mut session = trainer.start_session(criteria).unwrap();
    assert_eq!(session.puzzle().id, "promo");
    assert_eq!(trainer.submit(&mut session, "e8=Q").unwrap(), MoveResult::Solved);
    trainer.complete(session).unwrap();
}

#[test]
fn test_opening_phase_from_theme_marker() {
    let mut trainer = Trainer::with_seed(corpus(), MemoryProgressStore::new(), 3);
    let criteria = SelectionCriteria::new(Difficulty::Intermediate)
        .phase(Some(GamePhase::Opening))
        .theme("fork");

    let session = trainer.start_session(criteria).unwrap();
    assert_eq!(session.puzzle().id, "opening_trap");
    trainer.abandon(session).unwrap();
}

#[test]
fn test_theme_listing() {
    let store = corpus();
    let themes = store.theme_counts(10).unwrap();
    let names: Vec<&str> = themes.iter().map(|(name, _)| name.as_str()).collect();
    assert!(names.contains(&"castling"));
    assert!(names.contains(&"promotion"));
    assert!(themes.iter().all(|(_, count)| *count == 1));
}
