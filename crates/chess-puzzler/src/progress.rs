//! Attempt history and aggregate statistics.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

use crate::error::PuzzleError;
use crate::puzzle::Difficulty;
use crate::store::ProgressStore;

/// One finished session. Appended to the progress store, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptOutcome {
    pub puzzle_id: String,
    #[serde(default)]
    pub rating: u16,
    pub difficulty: Difficulty,
    pub solved: bool,
    #[serde(alias = "attempts")]
    pub incorrect_attempts: u32,
    #[serde(default)]
    pub hints_used: u32,
    #[serde(alias = "time_taken")]
    pub elapsed_secs: f64,
    #[serde(deserialize_with = "utc_or_naive")]
    pub timestamp: DateTime<Utc>,
}

/// RFC 3339, or a zone-less ISO timestamp taken as UTC.
fn utc_or_naive<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>()
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

/// Totals derived from the full outcome history.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateStats {
    /// Solved outcomes, replays included
    pub total_solved: usize,
    /// Every recorded outcome
    pub total_attempted: usize,
    /// Solved outcomes over all outcomes, in percent
    pub success_rate: f64,
    /// Solved outcomes at the end of the history
    pub current_streak: usize,
    pub best_streak: usize,
    /// Solved outcomes per difficulty level, index 0 = level 1
    pub solved_by_difficulty: [usize; 5],
    #[serde(skip)]
    pub solved_ids: HashSet<String>,
}

impl AggregateStats {
    pub fn from_outcomes(outcomes: &[AttemptOutcome]) -> Self {
        let mut stats = AggregateStats {
            total_attempted: outcomes.len(),
            ..Default::default()
        };

        let mut solved_count = 0usize;
        let mut run = 0usize;
        for outcome in outcomes {
            if outcome.solved {
                solved_count += 1;
                run += 1;
                stats.best_streak = stats.best_streak.max(run);
                stats.solved_by_difficulty[usize::from(outcome.difficulty.level() - 1)] += 1;
                stats.solved_ids.insert(outcome.puzzle_id.clone());
            } else {
                run = 0;
            }
        }

        stats.current_streak = run;
        stats.total_solved = solved_count;
        if !outcomes.is_empty() {
            stats.success_rate = solved_count as f64 / outcomes.len() as f64 * 100.0;
        }
        stats
    }

    pub fn solved_at(&self, difficulty: Difficulty) -> usize {
        self.solved_by_difficulty[usize::from(difficulty.level() - 1)]
    }
}

/// Records outcomes and answers history questions over a `ProgressStore`.
pub struct ProgressTracker<P> {
    store: P,
}

impl<P: ProgressStore> ProgressTracker<P> {
    pub fn new(store: P) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    pub fn record(&mut self, outcome: &AttemptOutcome) -> Result<(), PuzzleError> {
        self.store.append_outcome(outcome)?;
        info!(
            puzzle_id = %outcome.puzzle_id,
            solved = outcome.solved,
            incorrect = outcome.incorrect_attempts,
            hints = outcome.hints_used,
            elapsed_secs = outcome.elapsed_secs,
            "Attempt recorded"
        );
        Ok(())
    }

    pub fn stats(&self) -> Result<AggregateStats, PuzzleError> {
        let outcomes = self.store.all_outcomes()?;
        let stats = AggregateStats::from_outcomes(&outcomes);
        debug!(
            attempted = stats.total_attempted,
            solved = stats.total_solved,
            streak = stats.current_streak,
            "Stats computed"
        );
        Ok(stats)
    }

    pub fn solved_ids(&self) -> Result<HashSet<String>, PuzzleError> {
        Ok(self
            .store
            .all_outcomes()?
            .into_iter()
            .filter(|o| o.solved)
            .map(|o| o.puzzle_id)
            .collect())
    }

    pub fn has_attempted(&self, puzzle_id: &str) -> Result<bool, PuzzleError> {
        Ok(self
            .store
            .all_outcomes()?
            .iter()
            .any(|o| o.puzzle_id == puzzle_id))
    }

    pub fn has_solved(&self, puzzle_id: &str) -> Result<bool, PuzzleError> {
        Ok(self
            .store
            .all_outcomes()?
            .iter()
            .any(|o| o.solved && o.puzzle_id == puzzle_id))
    }

    /// Mean seconds over solved outcomes, optionally at one difficulty.
    pub fn average_time(&self, difficulty: Option<Difficulty>) -> Result<Option<f64>, PuzzleError> {
        let times: Vec<f64> = self
            .store
            .all_outcomes()?
            .into_iter()
            .filter(|o| o.solved && difficulty.map_or(true, |d| o.difficulty == d))
            .map(|o| o.elapsed_secs)
            .collect();

        if times.is_empty() {
            return Ok(None);
        }
        Ok(Some(times.iter().sum::<f64>() / times.len() as f64))
    }

    /// Percent of outcomes at `difficulty` that were solved.
    pub fn success_rate_for(&self, difficulty: Difficulty) -> Result<Option<f64>, PuzzleError> {
        let at_level: Vec<bool> = self
            .store
            .all_outcomes()?
            .into_iter()
            .filter(|o| o.difficulty == difficulty)
            .map(|o| o.solved)
            .collect();

        if at_level.is_empty() {
            return Ok(None);
        }
        let solved = at_level.iter().filter(|s| **s).count();
        Ok(Some(solved as f64 / at_level.len() as f64 * 100.0))
    }
}
