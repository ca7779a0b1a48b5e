//! Progressive hints for the move a session is waiting on.
//!
//! Each level reveals a little more of the expected move. The level depends
//! only on how many hints the session has already handed out, so the
//! generator itself never changes session state; `Session::request_hint`
//! does the counting.

use chess_core::rules::{move_destination, move_origin};
use chess_core::{CanonicalMove, Rules};
use shakmaty::{Role, Square};

use crate::error::PuzzleError;
use crate::validator::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HintLevel {
    Piece = 1,
    Origin = 2,
    Destination = 3,
    FullMove = 4,
}

impl HintLevel {
    /// Level for the next hint after `consumed` hints.
    pub fn after(consumed: u32) -> Self {
        match consumed {
            0 => HintLevel::Piece,
            1 => HintLevel::Origin,
            2 => HintLevel::Destination,
            _ => HintLevel::FullMove,
        }
    }

    pub fn number(self) -> u8 {
        self as u8
    }

    /// Score penalty for taking a hint at this level.
    pub fn penalty(self) -> u32 {
        match self {
            HintLevel::Piece => 10,
            HintLevel::Origin => 20,
            HintLevel::Destination => 30,
            HintLevel::FullMove => 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HintPayload {
    Piece { role: Role },
    Origin { role: Role, from: Square },
    Destination { role: Role, from: Square, to: Square },
    FullMove { mv: CanonicalMove, san: String },
}

impl HintPayload {
    pub fn level(&self) -> HintLevel {
        match self {
            HintPayload::Piece { .. } => HintLevel::Piece,
            HintPayload::Origin { .. } => HintLevel::Origin,
            HintPayload::Destination { .. } => HintLevel::Destination,
            HintPayload::FullMove { .. } => HintLevel::FullMove,
        }
    }

    /// Squares to highlight on the board. Empty for the piece-only hint.
    pub fn highlight_squares(&self) -> Vec<Square> {
        match self {
            HintPayload::Piece { .. } => Vec::new(),
            HintPayload::Origin { from, .. } => vec![*from],
            HintPayload::Destination { from, to, .. } => vec![*from, *to],
            HintPayload::FullMove { mv, .. } => vec![mv.from, mv.to],
        }
    }
}

/// Hint for the session's expected move at the session's next level.
pub fn hint<B: Rules>(session: &Session<B>) -> Result<HintPayload, PuzzleError> {
    session.ensure_active()?;
    let mv = session.expected_move().ok_or(PuzzleError::SessionFinished)?;
    let board = session.board();

    let from = move_origin(mv);
    let to = move_destination(mv);
    let role = match board.piece_at(from) {
        Some(piece) => piece.role,
        None => mv.role(),
    };

    Ok(match HintLevel::after(session.hints_used()) {
        HintLevel::Piece => HintPayload::Piece { role },
        HintLevel::Origin => HintPayload::Origin { role, from },
        HintLevel::Destination => HintPayload::Destination { role, from, to },
        HintLevel::FullMove => HintPayload::FullMove {
            mv: CanonicalMove::of(mv),
            san: board.san(mv),
        },
    })
}

/// Sum of penalties for `count` hints taken in order.
pub fn total_penalty(count: u32) -> u32 {
    (0..count).map(|n| HintLevel::after(n).penalty()).sum()
}
