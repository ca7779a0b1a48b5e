//! Puzzle core error types

use thiserror::Error;

/// Failures reported by a puzzle or progress store. Passed through to the
/// caller untouched; the core never retries them.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Corrupt record '{id}': {reason}")]
    Corrupt { id: String, reason: String },
}

#[derive(Error, Debug)]
pub enum PuzzleError {
    #[error("No puzzles available in database")]
    NotFound,

    #[error("Invalid puzzle '{id}': {reason}")]
    InvalidPuzzle { id: String, reason: String },

    #[error("Difficulty must be 1-5, got {0}")]
    InvalidDifficulty(u8),

    #[error("Unknown game phase '{0}' (expected opening, middlegame, endgame or any)")]
    InvalidGamePhase(String),

    #[error("Puzzle session already finished")]
    SessionFinished,

    #[error("Puzzle session is not solved yet")]
    SessionNotSolved,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PuzzleError {
    pub(crate) fn invalid(id: &str, reason: impl Into<String>) -> Self {
        PuzzleError::InvalidPuzzle {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}
