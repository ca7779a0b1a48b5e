#![allow(dead_code)]

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use chess_puzzler::PuzzleRecord;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Generate a unique suffix based on timestamp to avoid collisions.
pub fn unique_suffix() -> String {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}", ts % 1_000_000_000)
}

/// Fresh path for a throwaway file under the system temp dir.
pub fn temp_file(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("puzzle_trainer_{}", unique_suffix()))
        .join(name)
}

/// 1. e4, then the solver answers e5; the trailing Nf3 is never played.
pub fn open_e4_e5() -> PuzzleRecord {
    PuzzleRecord::new("scenario", START_FEN, &["e2e4", "e7e5", "g1f3"], 1000, 32)
}

/// Two solver moves: e5 then Nc6 after the Nf3 reply.
pub fn two_move_line() -> PuzzleRecord {
    PuzzleRecord::new("two_moves", START_FEN, &["e2e4", "e7e5", "g1f3", "b8c6"], 1000, 32)
}

/// White castles short after Black does.
pub fn castle_line() -> PuzzleRecord {
    PuzzleRecord::new(
        "castle",
        "r1bqk2r/pppp1ppp/2n2n2/2b1p3/2B1P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 4 4",
        &["e8g8", "e1g1"],
        1400,
        32,
    )
    .with_themes(&["castling"])
}

/// Queen promotion on e8.
pub fn promotion_line() -> PuzzleRecord {
    PuzzleRecord::new("promo", "8/4P3/8/8/8/8/8/k6K b - - 0 1", &["a1b2", "e7e8q"], 1300, 3)
        .with_themes(&["promotion"])
}

/// Two white knights can reach d2; only the b1 knight is right.
pub fn knight_pair_line() -> PuzzleRecord {
    PuzzleRecord::new("knights", "4k3/8/8/8/8/8/8/1N2KN2 b - - 0 1", &["e8e7", "b1d2"], 1100, 4)
}

/// Catalog puzzle with the given rating, piece count and themes.
pub fn catalog_puzzle(id: &str, rating: u16, pieces: u32, themes: &[&str]) -> PuzzleRecord {
    PuzzleRecord::new(id, START_FEN, &["e2e4", "e7e5"], rating, pieces).with_themes(themes)
}
