//! Chess puzzle trainer core.
//!
//! Selection with progressive criteria relaxation, a move-validation session
//! that accepts algebraic or coordinate input, progressive hints derived from
//! the session, and progress statistics fed back into selection.

pub mod error;
pub mod hints;
pub mod progress;
pub mod puzzle;
pub mod selector;
pub mod store;
pub mod timer;
pub mod trainer;
pub mod validator;

pub use error::{PuzzleError, StoreError};
pub use hints::{HintLevel, HintPayload};
pub use progress::{AggregateStats, AttemptOutcome, ProgressTracker};
pub use puzzle::{Difficulty, GamePhase, PuzzleRecord, RatingBand};
pub use selector::{PuzzleSelector, Selection, SelectionCriteria};
pub use store::{CandidateQuery, MemoryProgressStore, MemoryPuzzleStore, ProgressStore, PuzzleStore};
pub use timer::{format_clock, PuzzleTimer};
pub use trainer::Trainer;
pub use validator::{MoveResult, Session, SessionState};
