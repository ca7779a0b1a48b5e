//! Move validation session.
//!
//! A `Session` owns the board for one solving attempt and walks the
//! solution line: index 0 is the opponent's setup move (already played when
//! the session opens), odd indices are the solver's moves and even indices
//! after 0 are the opponent's replies.

use std::time::Duration;

use chess_core::rules::{move_destination, move_origin};
use chess_core::{parse_coordinate, parse_move, CanonicalMove, Rules};
use chrono::Utc;
use shakmaty::{Chess, Color, Move, Square};
use tracing::{debug, info, warn};

use crate::error::PuzzleError;
use crate::hints::{self, HintPayload};
use crate::progress::AttemptOutcome;
use crate::puzzle::PuzzleRecord;
use crate::timer::PuzzleTimer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingMove,
    Solved,
    Abandoned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveResult {
    /// Correct; the opponent answered with `reply`.
    Continue { reply: CanonicalMove },
    /// Correct and the line is finished.
    Solved,
    /// Legal but not the solution move. Counted.
    Incorrect,
    /// Not a legal move in either notation. Not counted.
    Illegal { reason: String },
}

#[derive(Debug)]
pub struct Session<B: Rules = Chess> {
    puzzle: PuzzleRecord,
    board: B,
    solution: Vec<Move>,
    cursor: usize,
    misses_here: u32,
    misses_total: u32,
    hints_used: u32,
    state: SessionState,
    last_move: Option<Move>,
    timer: PuzzleTimer,
    finalized: bool,
}

impl<B: Rules> Session<B> {
    /// Open a session, rejecting records whose line does not replay.
    ///
    /// Every move of the line is resolved against the board up front so a
    /// broken record fails here instead of halfway through solving.
    pub fn open(puzzle: PuzzleRecord, time_limit: Option<Duration>) -> Result<Self, PuzzleError> {
        puzzle.check_shape()?;

        let start =
            B::from_fen(&puzzle.fen).map_err(|e| PuzzleError::invalid(&puzzle.id, e.to_string()))?;

        let mut replay = start.clone();
        let mut solution = Vec::with_capacity(puzzle.moves.len());
        for (ply, text) in puzzle.moves.iter().enumerate() {
            let mv = parse_coordinate(&replay, text).map_err(|e| {
                PuzzleError::invalid(&puzzle.id, format!("move {ply} ({text}): {e}"))
            })?;
            replay.apply_move(&mv);
            solution.push(mv);
        }

        let mut board = start;
        board.apply_move(&solution[0]);

        info!(
            puzzle_id = %puzzle.id,
            rating = puzzle.rating,
            solver_moves = puzzle.solver_moves().len(),
            "Session opened"
        );

        Ok(Self {
            last_move: Some(solution[0].clone()),
            puzzle,
            board,
            solution,
            cursor: 1,
            misses_here: 0,
            misses_total: 0,
            hints_used: 0,
            state: SessionState::AwaitingMove,
            timer: PuzzleTimer::start(time_limit),
            finalized: false,
        })
    }

    pub fn submit(&mut self, text: &str) -> Result<MoveResult, PuzzleError> {
        self.ensure_active()?;

        let mv = match parse_move(&self.board, text) {
            Ok(mv) => mv,
            Err(e) => {
                debug!(puzzle_id = %self.puzzle.id, input = text, "Move rejected: {e}");
                return Ok(MoveResult::Illegal {
                    reason: e.to_string(),
                });
            }
        };

        let expected = &self.solution[self.cursor];
        if CanonicalMove::of(&mv) != CanonicalMove::of(expected) {
            self.misses_here += 1;
            self.misses_total += 1;
            debug!(
                puzzle_id = %self.puzzle.id,
                cursor = self.cursor,
                misses = self.misses_here,
                "Incorrect move"
            );
            return Ok(MoveResult::Incorrect);
        }

        self.board.apply_move(&mv);
        self.last_move = Some(mv);
        self.misses_here = 0;

        if self.cursor + 2 >= self.solution.len() {
            self.cursor = self.solution.len();
            self.state = SessionState::Solved;
            info!(
                puzzle_id = %self.puzzle.id,
                incorrect = self.misses_total,
                hints = self.hints_used,
                elapsed_secs = self.timer.elapsed().as_secs_f64(),
                "Puzzle solved"
            );
            return Ok(MoveResult::Solved);
        }

        let reply = self.solution[self.cursor + 1].clone();
        self.board.apply_move(&reply);
        self.cursor += 2;
        let canonical = CanonicalMove::of(&reply);
        self.last_move = Some(reply);
        debug!(puzzle_id = %self.puzzle.id, cursor = self.cursor, reply = %canonical, "Correct move");

        Ok(MoveResult::Continue { reply: canonical })
    }

    /// Next hint for the current move. Counts against the session.
    pub fn request_hint(&mut self) -> Result<HintPayload, PuzzleError> {
        let payload = hints::hint(self)?;
        self.hints_used += 1;
        debug!(
            puzzle_id = %self.puzzle.id,
            level = payload.level().number(),
            hints = self.hints_used,
            "Hint given"
        );
        Ok(payload)
    }

    /// Finish the attempt. A solved session still counts as solved.
    pub fn abandon(mut self) -> AttemptOutcome {
        if self.state == SessionState::AwaitingMove {
            self.state = SessionState::Abandoned;
            info!(puzzle_id = %self.puzzle.id, "Session abandoned");
        }
        self.outcome()
    }

    /// Outcome of a solved session.
    ///
    /// An unsolved session is consumed without an outcome and the drop
    /// warning fires; use `abandon` to give up on a puzzle.
    pub fn complete(mut self) -> Result<AttemptOutcome, PuzzleError> {
        if self.state != SessionState::Solved {
            return Err(PuzzleError::SessionNotSolved);
        }
        Ok(self.outcome())
    }

    fn outcome(&mut self) -> AttemptOutcome {
        self.finalized = true;
        AttemptOutcome {
            puzzle_id: self.puzzle.id.clone(),
            rating: self.puzzle.rating,
            difficulty: self.puzzle.difficulty(),
            solved: self.state == SessionState::Solved,
            incorrect_attempts: self.misses_total,
            hints_used: self.hints_used,
            elapsed_secs: self.timer.elapsed().as_secs_f64(),
            timestamp: Utc::now(),
        }
    }

    pub(crate) fn ensure_active(&self) -> Result<(), PuzzleError> {
        match self.state {
            SessionState::AwaitingMove => Ok(()),
            _ => Err(PuzzleError::SessionFinished),
        }
    }

    pub fn puzzle(&self) -> &PuzzleRecord {
        &self.puzzle
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state != SessionState::AwaitingMove
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The solver move the session is waiting for, if any.
    pub fn expected_move(&self) -> Option<&Move> {
        match self.state {
            SessionState::AwaitingMove => self.solution.get(self.cursor),
            _ => None,
        }
    }

    /// Solver moves still to be found.
    pub fn moves_remaining(&self) -> usize {
        let left = self.solution.len().saturating_sub(self.cursor);
        left.div_ceil(2)
    }

    pub fn incorrect_here(&self) -> u32 {
        self.misses_here
    }

    pub fn incorrect_total(&self) -> u32 {
        self.misses_total
    }

    pub fn hints_used(&self) -> u32 {
        self.hints_used
    }

    /// Score penalty accumulated from the hints taken so far.
    pub fn hint_penalty(&self) -> u32 {
        hints::total_penalty(self.hints_used)
    }

    pub fn fen(&self) -> String {
        self.board.to_fen()
    }

    pub fn side_to_move(&self) -> Color {
        self.board.turn()
    }

    /// Origin and destination of the last move played on the board.
    pub fn last_move_squares(&self) -> Vec<Square> {
        self.last_move
            .as_ref()
            .map(|mv| vec![move_origin(mv), move_destination(mv)])
            .unwrap_or_default()
    }

    pub fn timer(&self) -> &PuzzleTimer {
        &self.timer
    }
}

impl<B: Rules> Drop for Session<B> {
    fn drop(&mut self) {
        if !self.finalized {
            warn!(
                puzzle_id = %self.puzzle.id,
                "Session dropped without abandon or complete; outcome not recorded"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn open(fen: &str, moves: &[&str]) -> Session {
        Session::open(PuzzleRecord::new("t1", fen, moves, 1500, 32), None).unwrap()
    }

    fn scenario() -> Session {
        open(START_FEN, &["e2e4", "e7e5", "g1f3"])
    }

    #[test]
    fn test_opening_applies_setup_move() {
        let session = scenario();
        assert_eq!(session.cursor(), 1);
        assert_eq!(session.side_to_move(), Color::Black);
        assert_eq!(session.last_move_squares(), vec![Square::E2, Square::E4]);
        assert_eq!(session.moves_remaining(), 1);
        assert_eq!(session.state(), SessionState::AwaitingMove);
    }

    #[test]
    fn test_coordinate_solution_solves() {
        let mut session = scenario();
        assert_eq!(session.submit("e7e5").unwrap(), MoveResult::Solved);
        assert_eq!(session.state(), SessionState::Solved);
        assert_eq!(session.moves_remaining(), 0);
        // Trailing opponent move is not played
        assert_eq!(session.side_to_move(), Color::White);
        session.abandon();
    }

    #[test]
    fn test_algebraic_solution_solves() {
        let mut session = scenario();
        assert_eq!(session.submit("e5").unwrap(), MoveResult::Solved);
        session.abandon();
    }

    #[test]
    fn test_wrong_side_move_is_illegal() {
        let mut session = scenario();
        assert!(matches!(session.submit("Nf3").unwrap(), MoveResult::Illegal { .. }));
        assert_eq!(session.cursor(), 1);
        assert_eq!(session.incorrect_total(), 0);
        session.abandon();
    }

    #[test]
    fn test_wrong_move_is_incorrect_and_board_unchanged() {
        let mut session = scenario();
        let before = session.fen();
        assert_eq!(session.submit("e7e6").unwrap(), MoveResult::Incorrect);
        assert_eq!(session.cursor(), 1);
        assert_eq!(session.fen(), before);
        assert_eq!(session.incorrect_here(), 1);
        assert_eq!(session.incorrect_total(), 1);
        session.abandon();
    }

    #[test]
    fn test_lowercase_piece_letter_is_illegal() {
        let mut session = scenario();
        assert!(matches!(session.submit("nc6").unwrap(), MoveResult::Illegal { .. }));
        assert_eq!(session.submit("Nc6").unwrap(), MoveResult::Incorrect);
        session.abandon();
    }

    #[test]
    fn test_continue_applies_reply() {
        let mut session = open(START_FEN, &["e2e4", "e7e5", "g1f3", "b8c6"]);
        assert_eq!(session.submit("e6").unwrap(), MoveResult::Incorrect);
        let result = session.submit("e5").unwrap();
        assert_eq!(
            result,
            MoveResult::Continue {
                reply: CanonicalMove {
                    from: Square::G1,
                    to: Square::F3,
                    promotion: None
                }
            }
        );
        assert_eq!(session.cursor(), 3);
        assert_eq!(session.incorrect_here(), 0);
        assert_eq!(session.incorrect_total(), 1);
        assert_eq!(session.last_move_squares(), vec![Square::G1, Square::F3]);

        assert_eq!(session.submit("Nc6").unwrap(), MoveResult::Solved);
        let outcome = session.complete().unwrap();
        assert!(outcome.solved);
        assert_eq!(outcome.incorrect_attempts, 1);
    }

    #[test]
    fn test_finished_session_rejects_moves_and_hints() {
        let mut session = scenario();
        session.submit("e5").unwrap();
        assert!(matches!(session.submit("Nc6"), Err(PuzzleError::SessionFinished)));
        assert!(matches!(session.request_hint(), Err(PuzzleError::SessionFinished)));
        assert_eq!(session.hints_used(), 0);
        session.abandon();
    }

    #[test]
    fn test_abandon_keeps_counters() {
        let mut session = scenario();
        session.submit("e6").unwrap();
        session.request_hint().unwrap();
        let outcome = session.abandon();
        assert!(!outcome.solved);
        assert_eq!(outcome.incorrect_attempts, 1);
        assert_eq!(outcome.hints_used, 1);
        assert_eq!(outcome.puzzle_id, "t1");
    }

    #[test]
    fn test_hint_penalty_accumulates() {
        let mut session = scenario();
        assert_eq!(session.hint_penalty(), 0);
        session.request_hint().unwrap();
        session.request_hint().unwrap();
        assert_eq!(session.hint_penalty(), 30);
        session.abandon();
    }

    #[test]
    fn test_complete_requires_solved() {
        let session = scenario();
        assert!(matches!(session.complete(), Err(PuzzleError::SessionNotSolved)));
    }

    #[test]
    fn test_castling_in_both_notations() {
        let fen = "r1bqk2r/pppp1ppp/2n2n2/2b1p3/2B1P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 4 4";
        for input in ["O-O", "0-0", "e1g1"] {
            let mut session = open(fen, &["e8g8", "e1g1"]);
            assert_eq!(session.submit(input).unwrap(), MoveResult::Solved, "{input}");
            session.abandon();
        }
    }

    #[test]
    fn test_promotion_piece_must_match() {
        let fen = "8/4P3/8/8/8/8/8/k6K b - - 0 1";
        let mut session = open(fen, &["a1b2", "e7e8q"]);
        assert_eq!(session.submit("e8=N").unwrap(), MoveResult::Incorrect);
        assert!(matches!(session.submit("e8").unwrap(), MoveResult::Illegal { .. }));
        assert_eq!(session.submit("e8=Q").unwrap(), MoveResult::Solved);
        session.abandon();
    }

    #[test]
    fn test_ambiguous_san_is_illegal() {
        let fen = "4k3/8/8/8/8/8/8/1N2KN2 b - - 0 1";
        let mut session = open(fen, &["e8e7", "b1d2"]);
        assert!(matches!(session.submit("Nd2").unwrap(), MoveResult::Illegal { .. }));
        assert_eq!(session.submit("Nfd2").unwrap(), MoveResult::Incorrect);
        assert_eq!(session.submit("Nbd2").unwrap(), MoveResult::Solved);
        session.abandon();
    }

    #[test]
    fn test_open_rejects_broken_records() {
        let short = PuzzleRecord::new("s", START_FEN, &["e2e4"], 1500, 32);
        assert!(matches!(
            Session::<Chess>::open(short, None),
            Err(PuzzleError::InvalidPuzzle { .. })
        ));

        let bad_fen = PuzzleRecord::new("f", "nonsense", &["e2e4", "e7e5"], 1500, 32);
        assert!(matches!(
            Session::<Chess>::open(bad_fen, None),
            Err(PuzzleError::InvalidPuzzle { .. })
        ));

        let bad_line = PuzzleRecord::new("l", START_FEN, &["e2e4", "e2e4"], 1500, 32);
        assert!(matches!(
            Session::<Chess>::open(bad_line, None),
            Err(PuzzleError::InvalidPuzzle { .. })
        ));
    }
}
