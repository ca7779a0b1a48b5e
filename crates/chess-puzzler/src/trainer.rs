//! Caller-facing session API tying selection, validation and progress
//! together.

use std::time::Duration;

use tracing::info;

use crate::error::PuzzleError;
use crate::hints::HintPayload;
use crate::progress::{AggregateStats, AttemptOutcome, ProgressTracker};
use crate::selector::{PuzzleSelector, SelectionCriteria};
use crate::store::{ProgressStore, PuzzleStore};
use crate::validator::{MoveResult, Session};

pub struct Trainer<S, P> {
    selector: PuzzleSelector<S>,
    tracker: ProgressTracker<P>,
    time_limit: Option<Duration>,
}

impl<S: PuzzleStore, P: ProgressStore> Trainer<S, P> {
    pub fn new(puzzles: S, progress: P) -> Self {
        Self {
            selector: PuzzleSelector::new(puzzles),
            tracker: ProgressTracker::new(progress),
            time_limit: None,
        }
    }

    pub fn with_seed(puzzles: S, progress: P, seed: u64) -> Self {
        Self {
            selector: PuzzleSelector::with_seed(puzzles, seed),
            tracker: ProgressTracker::new(progress),
            time_limit: None,
        }
    }

    pub fn with_time_limit(mut self, limit: Option<Duration>) -> Self {
        self.time_limit = limit;
        self
    }

    pub fn selector(&self) -> &PuzzleSelector<S> {
        &self.selector
    }

    pub fn tracker(&self) -> &ProgressTracker<P> {
        &self.tracker
    }

    /// Pick a puzzle the player has not solved yet (relaxing as needed) and
    /// open a session on it.
    pub fn start_session(&mut self, criteria: SelectionCriteria) -> Result<Session, PuzzleError> {
        let solved = self.tracker.solved_ids()?;
        let criteria = criteria.exclude(solved);

        let puzzle = self.selector.select(&criteria)?;
        info!(
            puzzle_id = %puzzle.id,
            difficulty = criteria.difficulty.level(),
            phase = ?criteria.phase,
            theme = ?criteria.theme,
            "Starting session"
        );
        Session::open(puzzle, self.time_limit)
    }

    pub fn submit(&self, session: &mut Session, text: &str) -> Result<MoveResult, PuzzleError> {
        session.submit(text)
    }

    pub fn request_hint(&self, session: &mut Session) -> Result<HintPayload, PuzzleError> {
        session.request_hint()
    }

    /// Give up on the session and record it as not solved.
    pub fn abandon(&mut self, session: Session) -> Result<AttemptOutcome, PuzzleError> {
        let outcome = session.abandon();
        self.tracker.record(&outcome)?;
        Ok(outcome)
    }

    /// Record a solved session.
    pub fn complete(&mut self, session: Session) -> Result<AttemptOutcome, PuzzleError> {
        let outcome = session.complete()?;
        self.tracker.record(&outcome)?;
        Ok(outcome)
    }

    pub fn stats(&self) -> Result<AggregateStats, PuzzleError> {
        self.tracker.stats()
    }
}
