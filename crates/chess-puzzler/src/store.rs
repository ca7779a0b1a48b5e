//! Storage collaborator interfaces and in-memory implementations.
//!
//! The core never runs queries itself. It hands a declarative
//! `CandidateQuery` to a `PuzzleStore` and appends outcomes to a
//! `ProgressStore`. The in-memory stores back the tests and small corpora;
//! the SQLite and JSON-file stores live in the `puzzle-store` crate.

use std::collections::{HashMap, HashSet};

use crate::error::StoreError;
use crate::progress::AttemptOutcome;
use crate::puzzle::{GamePhase, PuzzleRecord, RatingBand};

/// One filtered candidate request. `None` fields are unconstrained.
#[derive(Debug, Clone, Copy)]
pub struct CandidateQuery<'a> {
    pub rating: RatingBand,
    pub phase: Option<GamePhase>,
    pub theme: Option<&'a str>,
    pub exclude: Option<&'a HashSet<String>>,
}

impl<'a> CandidateQuery<'a> {
    pub fn unconstrained() -> Self {
        Self {
            rating: RatingBand::ALL,
            phase: None,
            theme: None,
            exclude: None,
        }
    }

    pub fn rating_only(rating: RatingBand) -> Self {
        Self {
            rating,
            ..Self::unconstrained()
        }
    }

    /// Reference predicate every store must agree with.
    pub fn matches(&self, puzzle: &PuzzleRecord) -> bool {
        self.rating.contains(puzzle.rating)
            && self.phase.map_or(true, |p| puzzle.phase() == p)
            && self.theme.map_or(true, |t| puzzle.has_theme(t))
            && self.exclude.map_or(true, |ids| !ids.contains(&puzzle.id))
    }
}

pub trait PuzzleStore {
    /// All puzzles matching the query, in any order. May be empty.
    fn find_candidates(&self, query: &CandidateQuery<'_>) -> Result<Vec<PuzzleRecord>, StoreError>;

    /// True only when the store holds no puzzles at all.
    fn corpus_empty(&self) -> Result<bool, StoreError>;

    fn find_by_id(&self, id: &str) -> Result<Option<PuzzleRecord>, StoreError>;

    /// Theme names with their puzzle counts, most common first.
    fn theme_counts(&self, limit: usize) -> Result<Vec<(String, usize)>, StoreError>;
}

pub trait ProgressStore {
    /// Append one outcome. Either the whole record lands or nothing does.
    fn append_outcome(&mut self, outcome: &AttemptOutcome) -> Result<(), StoreError>;

    /// Snapshot of every outcome in append order.
    fn all_outcomes(&self) -> Result<Vec<AttemptOutcome>, StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryPuzzleStore {
    puzzles: Vec<PuzzleRecord>,
}

impl MemoryPuzzleStore {
    pub fn new(puzzles: Vec<PuzzleRecord>) -> Self {
        Self { puzzles }
    }

    pub fn insert(&mut self, puzzle: PuzzleRecord) {
        self.puzzles.retain(|p| p.id != puzzle.id);
        self.puzzles.push(puzzle);
    }

    pub fn len(&self) -> usize {
        self.puzzles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.puzzles.is_empty()
    }
}

impl PuzzleStore for MemoryPuzzleStore {
    fn find_candidates(&self, query: &CandidateQuery<'_>) -> Result<Vec<PuzzleRecord>, StoreError> {
        Ok(self
            .puzzles
            .iter()
            .filter(|p| query.matches(p))
            .cloned()
            .collect())
    }

    fn corpus_empty(&self) -> Result<bool, StoreError> {
        Ok(self.puzzles.is_empty())
    }

    fn find_by_id(&self, id: &str) -> Result<Option<PuzzleRecord>, StoreError> {
        Ok(self.puzzles.iter().find(|p| p.id == id).cloned())
    }

    fn theme_counts(&self, limit: usize) -> Result<Vec<(String, usize)>, StoreError> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for puzzle in &self.puzzles {
            let distinct: HashSet<&str> = puzzle.themes.iter().map(String::as_str).collect();
            for theme in distinct {
                *counts.entry(theme).or_insert(0) += 1;
            }
        }

        let mut sorted: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(theme, count)| (theme.to_string(), count))
            .collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        sorted.truncate(limit);
        Ok(sorted)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryProgressStore {
    outcomes: Vec<AttemptOutcome>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for MemoryProgressStore {
    fn append_outcome(&mut self, outcome: &AttemptOutcome) -> Result<(), StoreError> {
        self.outcomes.push(outcome.clone());
        Ok(())
    }

    fn all_outcomes(&self) -> Result<Vec<AttemptOutcome>, StoreError> {
        Ok(self.outcomes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn store() -> MemoryPuzzleStore {
        MemoryPuzzleStore::new(vec![
            PuzzleRecord::new("a", START_FEN, &["e2e4", "e7e5"], 900, 32)
                .with_themes(&["fork", "pin"]),
            PuzzleRecord::new("b", START_FEN, &["e2e4", "e7e5"], 1500, 6)
                .with_themes(&["fork"]),
            PuzzleRecord::new("c", START_FEN, &["e2e4", "e7e5"], 2500, 20)
                .with_themes(&["skewer"]),
        ])
    }

    fn ids(puzzles: &[PuzzleRecord]) -> Vec<&str> {
        let mut ids: Vec<&str> = puzzles.iter().map(|p| p.id.as_str()).collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_query_filters_combine() {
        let store = store();
        let exclude: HashSet<String> = ["a".to_string()].into_iter().collect();

        let query = CandidateQuery {
            rating: RatingBand { min: 600, max: 1600 },
            phase: None,
            theme: Some("fork"),
            exclude: Some(&exclude),
        };
        assert_eq!(ids(&store.find_candidates(&query).unwrap()), vec!["b"]);

        let endgame = CandidateQuery {
            phase: Some(GamePhase::Endgame),
            ..CandidateQuery::unconstrained()
        };
        assert_eq!(ids(&store.find_candidates(&endgame).unwrap()), vec!["b"]);

        let all = store.find_candidates(&CandidateQuery::unconstrained()).unwrap();
        assert_eq!(ids(&all), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_theme_counts_sorted_by_popularity() {
        let counts = store().theme_counts(10).unwrap();
        assert_eq!(
            counts,
            vec![
                ("fork".to_string(), 2),
                ("pin".to_string(), 1),
                ("skewer".to_string(), 1),
            ]
        );
        assert_eq!(store().theme_counts(1).unwrap().len(), 1);
    }

    #[test]
    fn test_insert_replaces_same_id() {
        let mut store = store();
        store.insert(PuzzleRecord::new("a", START_FEN, &["e2e4", "e7e5"], 1000, 32));
        assert_eq!(store.len(), 3);
        assert_eq!(store.find_by_id("a").unwrap().unwrap().rating, 1000);
        assert!(store.find_by_id("zzz").unwrap().is_none());
    }

    #[test]
    fn test_empty_corpus() {
        assert!(MemoryPuzzleStore::default().corpus_empty().unwrap());
        assert!(!store().corpus_empty().unwrap());
    }
}
