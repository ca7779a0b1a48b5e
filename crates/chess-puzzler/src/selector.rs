//! Puzzle selection with progressive criteria relaxation.
//!
//! Criteria are relaxed one step at a time through a fixed table of tiers.
//! Each tier turns the caller's criteria into one `CandidateQuery`; the first
//! tier that yields candidates wins and one candidate is picked uniformly at
//! random.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::error::PuzzleError;
use crate::puzzle::{Difficulty, GamePhase, PuzzleRecord};
use crate::store::{CandidateQuery, PuzzleStore};

/// What the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionCriteria {
    pub difficulty: Difficulty,
    /// `None` = any phase
    pub phase: Option<GamePhase>,
    /// `None` = any theme
    pub theme: Option<String>,
    /// Puzzle ids to skip on the first tier (normally the solved set)
    pub exclude: HashSet<String>,
}

impl SelectionCriteria {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            phase: None,
            theme: None,
            exclude: HashSet::new(),
        }
    }

    pub fn phase(mut self, phase: Option<GamePhase>) -> Self {
        self.phase = phase;
        self
    }

    /// `"any"` (any case) or an empty string clears the theme filter.
    pub fn theme(mut self, theme: &str) -> Self {
        let theme = theme.trim();
        self.theme = if theme.is_empty() || theme.eq_ignore_ascii_case("any") {
            None
        } else {
            Some(theme.to_string())
        };
        self
    }

    pub fn exclude<I: IntoIterator<Item = String>>(mut self, ids: I) -> Self {
        self.exclude.extend(ids);
        self
    }
}

type QueryBuilder = for<'a> fn(&'a SelectionCriteria) -> CandidateQuery<'a>;

pub struct RelaxationTier {
    pub name: &'static str,
    pub build: QueryBuilder,
}

/// Tiers in the order they are tried.
pub const RELAXATION_TIERS: [RelaxationTier; 6] = [
    RelaxationTier { name: "exact", build: exact },
    RelaxationTier { name: "include_solved", build: include_solved },
    RelaxationTier { name: "adjacent_difficulty", build: adjacent_difficulty },
    RelaxationTier { name: "any_phase", build: any_phase },
    RelaxationTier { name: "any_theme", build: any_theme },
    RelaxationTier { name: "any_puzzle", build: any_puzzle },
];

fn exact(c: &SelectionCriteria) -> CandidateQuery<'_> {
    CandidateQuery {
        rating: c.difficulty.band(),
        phase: c.phase,
        theme: c.theme.as_deref(),
        exclude: Some(&c.exclude),
    }
}

fn include_solved(c: &SelectionCriteria) -> CandidateQuery<'_> {
    CandidateQuery {
        exclude: None,
        ..exact(c)
    }
}

fn adjacent_difficulty(c: &SelectionCriteria) -> CandidateQuery<'_> {
    CandidateQuery {
        rating: c.difficulty.widened_band(),
        ..include_solved(c)
    }
}

fn any_phase(c: &SelectionCriteria) -> CandidateQuery<'_> {
    CandidateQuery {
        phase: None,
        ..include_solved(c)
    }
}

fn any_theme(c: &SelectionCriteria) -> CandidateQuery<'_> {
    CandidateQuery::rating_only(c.difficulty.band())
}

fn any_puzzle(_c: &SelectionCriteria) -> CandidateQuery<'_> {
    CandidateQuery::unconstrained()
}

/// A selected puzzle and the 1-based tier that produced it.
#[derive(Debug, Clone)]
pub struct Selection {
    pub tier: usize,
    pub puzzle: PuzzleRecord,
}

pub struct PuzzleSelector<S> {
    store: S,
    rng: StdRng,
}

impl<S: PuzzleStore> PuzzleSelector<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            rng: StdRng::seed_from_u64(rand::random()),
        }
    }

    /// Deterministic candidate picks, for tests and reproducible runs.
    pub fn with_seed(store: S, seed: u64) -> Self {
        Self {
            store,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn select(&mut self, criteria: &SelectionCriteria) -> Result<PuzzleRecord, PuzzleError> {
        self.select_tiered(criteria).map(|s| s.puzzle)
    }

    /// Walk the relaxation tiers. `NotFound` means the corpus is empty.
    pub fn select_tiered(&mut self, criteria: &SelectionCriteria) -> Result<Selection, PuzzleError> {
        if self.store.corpus_empty()? {
            return Err(PuzzleError::NotFound);
        }

        for (index, tier) in RELAXATION_TIERS.iter().enumerate() {
            let query = (tier.build)(criteria);
            let mut candidates = self.store.find_candidates(&query)?;
            debug!(
                tier = tier.name,
                candidates = candidates.len(),
                "Selection tier queried"
            );

            if candidates.is_empty() {
                continue;
            }

            let pick = self.rng.random_range(0..candidates.len());
            let puzzle = candidates.swap_remove(pick);
            info!(
                puzzle_id = %puzzle.id,
                rating = puzzle.rating,
                tier = tier.name,
                "Puzzle selected"
            );
            return Ok(Selection {
                tier: index + 1,
                puzzle,
            });
        }

        warn!("Store reported puzzles but no tier returned a candidate");
        Err(PuzzleError::NotFound)
    }

    pub fn puzzle_by_id(&self, id: &str) -> Result<Option<PuzzleRecord>, PuzzleError> {
        Ok(self.store.find_by_id(id)?)
    }

    /// Available themes with puzzle counts, most popular first.
    pub fn available_themes(&self, limit: usize) -> Result<Vec<(String, usize)>, PuzzleError> {
        Ok(self.store.theme_counts(limit)?)
    }
}
