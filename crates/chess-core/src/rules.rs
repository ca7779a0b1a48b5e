//! Rules capability the puzzle validator is written against.
//!
//! The validator only needs move generation and move application; anything
//! that can produce the legal moves of a position and play one of them can
//! back a puzzle session. `shakmaty::Chess` is the implementation we ship.

use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, File, Move, Piece, Position, Role, Square};

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("Invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("Illegal position '{fen}': {reason}")]
    IllegalPosition { fen: String, reason: String },
}

/// Move generation and application over some board representation.
pub trait Rules: Clone {
    /// Build a position from FEN.
    fn from_fen(fen: &str) -> Result<Self, BoardError>;

    /// All legal moves for the side to move.
    fn legal_moves(&self) -> Vec<Move>;

    /// Play a move. Callers pass moves taken from `legal_moves`.
    fn apply_move(&mut self, mv: &Move);

    fn piece_at(&self, square: Square) -> Option<Piece>;

    fn turn(&self) -> Color;

    /// Number of pieces (both colors, kings included) on the board.
    fn piece_count(&self) -> usize;

    fn to_fen(&self) -> String;

    /// Standard algebraic notation for a legal move, with check/mate suffix.
    fn san(&self, mv: &Move) -> String;
}

impl Rules for Chess {
    fn from_fen(fen: &str) -> Result<Self, BoardError> {
        let parsed: Fen = fen.trim().parse().map_err(|e: shakmaty::fen::ParseFenError| {
            BoardError::InvalidFen {
                fen: fen.to_string(),
                reason: e.to_string(),
            }
        })?;

        parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| BoardError::IllegalPosition {
                fen: fen.to_string(),
                reason: e.to_string(),
            })
    }

    fn legal_moves(&self) -> Vec<Move> {
        Position::legal_moves(self).into_iter().collect()
    }

    fn apply_move(&mut self, mv: &Move) {
        self.play_unchecked(mv.clone());
    }

    fn piece_at(&self, square: Square) -> Option<Piece> {
        self.board().piece_at(square)
    }

    fn turn(&self) -> Color {
        Position::turn(self)
    }

    fn piece_count(&self) -> usize {
        self.board().occupied().count()
    }

    fn to_fen(&self) -> String {
        Fen::from_position(self, EnPassantMode::Legal).to_string()
    }

    fn san(&self, mv: &Move) -> String {
        let san = San::from_move(self, mv.clone());

        let mut after = self.clone();
        after.play_unchecked(mv.clone());
        let suffix = if after.is_checkmate() {
            "#"
        } else if after.is_check() {
            "+"
        } else {
            ""
        };

        format!("{san}{suffix}")
    }
}

/// Origin square of a move. Castling reports the king's square.
pub fn move_origin(mv: &Move) -> Square {
    match mv {
        Move::Normal { from, .. } => *from,
        Move::EnPassant { from, .. } => *from,
        Move::Castle { king, .. } => *king,
        Move::Put { to, .. } => *to,
    }
}

/// Destination square of a move. Castling reports where the king lands
/// (g- or c-file), not the rook square shakmaty encodes internally.
pub fn move_destination(mv: &Move) -> Square {
    match mv {
        Move::Normal { to, .. } => *to,
        Move::EnPassant { to, .. } => *to,
        Move::Castle { king, rook } => {
            let file = if rook.file() > king.file() { File::G } else { File::C };
            Square::from_coords(file, king.rank())
        }
        Move::Put { to, .. } => *to,
    }
}

pub fn role_name(role: Role) -> &'static str {
    match role {
        Role::Pawn => "pawn",
        Role::Knight => "knight",
        Role::Bishop => "bishop",
        Role::Rook => "rook",
        Role::Queen => "queen",
        Role::King => "king",
    }
}

pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn test_from_fen_start_position() {
        let pos = Chess::from_fen(START_FEN).unwrap();
        assert_eq!(Rules::legal_moves(&pos).len(), 20);
        assert_eq!(pos.piece_count(), 32);
        assert_eq!(Rules::turn(&pos), Color::White);
    }

    #[test]
    fn test_from_fen_rejects_garbage() {
        assert!(matches!(
            Chess::from_fen("not a fen"),
            Err(BoardError::InvalidFen { .. })
        ));
    }

    #[test]
    fn test_from_fen_rejects_missing_king() {
        assert!(matches!(
            Chess::from_fen("8/8/8/8/8/8/8/4K3 w - - 0 1"),
            Err(BoardError::IllegalPosition { .. })
        ));
    }

    #[test]
    fn test_castle_destination_is_king_square() {
        let pos =
            Chess::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let castles: Vec<Move> = Rules::legal_moves(&pos)
            .into_iter()
            .filter(|m| matches!(m, Move::Castle { .. }))
            .collect();
        assert_eq!(castles.len(), 2);

        let mut destinations: Vec<Square> = castles.iter().map(move_destination).collect();
        destinations.sort();
        assert_eq!(destinations, vec![Square::C1, Square::G1]);
        assert!(castles.iter().all(|m| move_origin(m) == Square::E1));
    }

    #[test]
    fn test_san_adds_check_suffix() {
        // Scholar's mate final position minus the mating move
        let pos = Chess::from_fen(
            "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4",
        )
        .unwrap();
        let mate = Rules::legal_moves(&pos)
            .into_iter()
            .find(|m| move_origin(m) == Square::H5 && move_destination(m) == Square::F7)
            .unwrap();
        assert_eq!(pos.san(&mate), "Qxf7#");
    }
}
