//! Move text parsing.
//!
//! Two input forms are accepted and resolved against the legal moves of a
//! position:
//! - standard algebraic (`Nf3`, `exd5`, `Nbd2`, `e8=Q+`, `O-O`)
//! - coordinate / UCI (`g1f3`, `e7e8q`, `e1g1` for castling)
//!
//! Both resolve to a legal `Move`; comparison between moves goes through
//! `CanonicalMove`, so the two forms of the same move are indistinguishable.
//! Piece letters in algebraic form are case-significant: `nf3` is not a
//! knight move, while coordinate squares are always lowercase.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use shakmaty::{File, Move, Rank, Role, Square};

use crate::rules::{move_destination, move_origin, Rules};

static SAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?P<castle>[O0]-[O0](?:-[O0])?)|(?P<role>[KQRBN])?(?P<file>[a-h])?(?P<rank>[1-8])?(?P<capture>x)?(?P<to>[a-h][1-8])(?:=?(?P<promo>[QRBN]))?)(?P<suffix>[+#])?$",
    )
    .expect("SAN pattern compiles")
});

static COORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<from>[a-h][1-8])(?P<to>[a-h][1-8])(?P<promo>[qrbn])?$")
        .expect("coordinate pattern compiles")
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotationError {
    #[error("Unrecognized move format: '{0}'")]
    Unrecognized(String),

    #[error("Move '{0}' is not legal in this position")]
    NotLegal(String),

    #[error("Move '{0}' is ambiguous, add the origin file or rank")]
    Ambiguous(String),
}

/// Origin, destination and promotion piece. Two moves are the same move
/// exactly when their canonical forms are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CanonicalMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Role>,
}

impl CanonicalMove {
    pub fn of(mv: &Move) -> Self {
        Self {
            from: move_origin(mv),
            to: move_destination(mv),
            promotion: mv.promotion(),
        }
    }
}

impl fmt::Display for CanonicalMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(role) = self.promotion {
            write!(f, "{}", role.char())?;
        }
        Ok(())
    }
}

/// Parse user move text in either notation against `board`.
///
/// Algebraic form is tried first. Text that also reads as a coordinate move
/// (`e7e5` is a valid fully-disambiguated pawn move) falls through to the
/// coordinate parser when the algebraic reading finds nothing.
pub fn parse_move<B: Rules>(board: &B, text: &str) -> Result<Move, NotationError> {
    let text = text.trim();

    let san_err = match parse_san(board, text) {
        Ok(mv) => return Ok(mv),
        Err(e @ NotationError::Ambiguous(_)) => return Err(e),
        Err(e) => e,
    };

    match parse_coordinate(board, text) {
        Ok(mv) => Ok(mv),
        Err(NotationError::Unrecognized(_)) => Err(san_err),
        Err(e) => Err(e),
    }
}

/// Resolve standard algebraic notation.
pub fn parse_san<B: Rules>(board: &B, text: &str) -> Result<Move, NotationError> {
    let caps = SAN_RE
        .captures(text)
        .ok_or_else(|| NotationError::Unrecognized(text.to_string()))?;

    let legal = board.legal_moves();

    let mut matches: Vec<Move> = if let Some(castle) = caps.name("castle") {
        let kingside = castle.as_str().len() == 3;
        legal
            .into_iter()
            .filter(|m| match m {
                Move::Castle { king, rook } => (rook.file() > king.file()) == kingside,
                _ => false,
            })
            .collect()
    } else {
        let role = caps
            .name("role")
            .and_then(|r| role_from_upper(r.as_str()))
            .unwrap_or(Role::Pawn);
        let from_file = caps.name("file").map(|f| file_from_char(f.as_str()));
        let from_rank = caps.name("rank").map(|r| rank_from_char(r.as_str()));
        let capture = caps.name("capture").is_some();
        let to = caps
            .name("to")
            .map(|t| square_from_str(t.as_str()))
            .ok_or_else(|| NotationError::Unrecognized(text.to_string()))?;
        let promotion = caps.name("promo").and_then(|p| role_from_upper(p.as_str()));

        legal
            .into_iter()
            .filter(|m| {
                if matches!(m, Move::Castle { .. }) || m.role() != role {
                    return false;
                }
                let origin = move_origin(m);
                move_destination(m) == to
                    && from_file.map_or(true, |f| origin.file() == f)
                    && from_rank.map_or(true, |r| origin.rank() == r)
                    && (!capture || m.is_capture())
                    && m.promotion() == promotion
            })
            .collect()
    };

    match matches.len() {
        0 => Err(NotationError::NotLegal(text.to_string())),
        1 => Ok(matches.remove(0)),
        _ => Err(NotationError::Ambiguous(text.to_string())),
    }
}

/// Resolve coordinate notation (`e2e4`, `e7e8q`).
pub fn parse_coordinate<B: Rules>(board: &B, text: &str) -> Result<Move, NotationError> {
    let caps = COORD_RE
        .captures(text)
        .ok_or_else(|| NotationError::Unrecognized(text.to_string()))?;

    let wanted = CanonicalMove {
        from: square_from_str(&caps["from"]),
        to: square_from_str(&caps["to"]),
        promotion: caps.name("promo").and_then(|p| role_from_lower(p.as_str())),
    };

    board
        .legal_moves()
        .into_iter()
        .find(|m| CanonicalMove::of(m) == wanted)
        .ok_or_else(|| NotationError::NotLegal(text.to_string()))
}

fn role_from_upper(s: &str) -> Option<Role> {
    match s {
        "K" => Some(Role::King),
        "Q" => Some(Role::Queen),
        "R" => Some(Role::Rook),
        "B" => Some(Role::Bishop),
        "N" => Some(Role::Knight),
        _ => None,
    }
}

fn role_from_lower(s: &str) -> Option<Role> {
    match s {
        "q" => Some(Role::Queen),
        "r" => Some(Role::Rook),
        "b" => Some(Role::Bishop),
        "n" => Some(Role::Knight),
        _ => None,
    }
}

// Inputs below are pre-validated by the regexes ([a-h], [1-8]).
fn file_from_char(s: &str) -> File {
    let idx = s.as_bytes()[0] - b'a';
    File::new(u32::from(idx))
}

fn rank_from_char(s: &str) -> Rank {
    let idx = s.as_bytes()[0] - b'1';
    Rank::new(u32::from(idx))
}

fn square_from_str(s: &str) -> Square {
    Square::from_coords(file_from_char(&s[0..1]), rank_from_char(&s[1..2]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::Chess;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn board(fen: &str) -> Chess {
        Chess::from_fen(fen).unwrap()
    }

    #[test]
    fn test_san_and_coordinate_agree() {
        let pos = board(START_FEN);
        let san = parse_move(&pos, "Nf3").unwrap();
        let uci = parse_move(&pos, "g1f3").unwrap();
        assert_eq!(CanonicalMove::of(&san), CanonicalMove::of(&uci));
        assert_eq!(CanonicalMove::of(&san).to_string(), "g1f3");
    }

    #[test]
    fn test_lowercase_piece_letter_rejected() {
        let pos = board(START_FEN);
        assert_eq!(
            parse_move(&pos, "nf3"),
            Err(NotationError::Unrecognized("nf3".to_string()))
        );
    }

    #[test]
    fn test_uppercase_coordinates_rejected() {
        let pos = board(START_FEN);
        assert!(parse_move(&pos, "G1F3").is_err());
    }

    #[test]
    fn test_long_pawn_form_reads_as_either_notation() {
        let pos = board(START_FEN);
        let mv = parse_move(&pos, "e2e4").unwrap();
        assert_eq!(CanonicalMove::of(&mv).to_string(), "e2e4");
    }

    #[test]
    fn test_pawn_capture_with_file() {
        let pos = board("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2");
        let mv = parse_move(&pos, "exd5").unwrap();
        assert!(mv.is_capture());
        assert_eq!(CanonicalMove::of(&mv).to_string(), "e4d5");
    }

    #[test]
    fn test_capture_marker_requires_capture() {
        let pos = board(START_FEN);
        assert_eq!(
            parse_move(&pos, "Nxf3"),
            Err(NotationError::NotLegal("Nxf3".to_string()))
        );
    }

    #[test]
    fn test_ambiguous_knight_move() {
        let pos = board("4k3/8/8/8/8/8/8/1N2KN2 w - - 0 1");
        assert_eq!(
            parse_move(&pos, "Nd2"),
            Err(NotationError::Ambiguous("Nd2".to_string()))
        );
        let mv = parse_move(&pos, "Nbd2").unwrap();
        assert_eq!(CanonicalMove::of(&mv).to_string(), "b1d2");
    }

    #[test]
    fn test_castling_both_forms() {
        let pos = board("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let san = parse_move(&pos, "O-O").unwrap();
        let zero = parse_move(&pos, "0-0").unwrap();
        let uci = parse_move(&pos, "e1g1").unwrap();
        assert_eq!(san, uci);
        assert_eq!(zero, uci);

        let long = parse_move(&pos, "O-O-O").unwrap();
        assert_eq!(CanonicalMove::of(&long).to_string(), "e1c1");
    }

    #[test]
    fn test_promotion_forms() {
        let pos = board("8/4P3/8/8/8/8/8/k6K w - - 0 1");
        let san = parse_move(&pos, "e8=Q").unwrap();
        let uci = parse_move(&pos, "e7e8q").unwrap();
        assert_eq!(CanonicalMove::of(&san), CanonicalMove::of(&uci));
        assert_eq!(CanonicalMove::of(&uci).to_string(), "e7e8q");

        // Pushing to the last rank without naming a piece is not a legal move
        assert!(matches!(parse_move(&pos, "e8"), Err(NotationError::NotLegal(_))));
    }

    #[test]
    fn test_check_suffix_accepted() {
        let pos = board("4k3/8/8/8/8/8/8/R3K3 w - - 0 1");
        let mv = parse_move(&pos, "Ra8+").unwrap();
        assert_eq!(CanonicalMove::of(&mv).to_string(), "a1a8");
    }

    #[test]
    fn test_garbage_is_unrecognized() {
        let pos = board(START_FEN);
        assert!(matches!(
            parse_move(&pos, "hello"),
            Err(NotationError::Unrecognized(_))
        ));
        assert!(matches!(parse_move(&pos, ""), Err(NotationError::Unrecognized(_))));
    }
}
