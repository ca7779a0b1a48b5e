//! Puzzle data model, difficulty bands and game-phase classification

pub mod themes;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PuzzleError;
use themes::{ENDGAME_PIECE_THRESHOLD, ENDGAME_THEMES, OPENING_THEMES};

/// Minimum solution length: the opponent's setup move plus one solver move
pub const MIN_SOLUTION_LENGTH: usize = 2;

/// One puzzle as supplied by the storage collaborator. Never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuzzleRecord {
    pub id: String,
    /// Position before the opponent's setup move
    pub fen: String,
    /// Coordinate-notation moves: [opponent_setup, solver_1, opponent_1, solver_2, ...]
    pub moves: Vec<String>,
    pub rating: u16,
    #[serde(default)]
    pub themes: Vec<String>,
    pub piece_count: u32,
    #[serde(default)]
    pub opening_tags: Vec<String>,
    #[serde(default)]
    pub rating_deviation: Option<u16>,
    #[serde(default)]
    pub popularity: Option<i32>,
    #[serde(default)]
    pub nb_plays: Option<u32>,
    #[serde(default)]
    pub game_url: Option<String>,
}

impl PuzzleRecord {
    pub fn new(id: &str, fen: &str, moves: &[&str], rating: u16, piece_count: u32) -> Self {
        Self {
            id: id.to_string(),
            fen: fen.to_string(),
            moves: moves.iter().map(|m| m.to_string()).collect(),
            rating,
            themes: Vec::new(),
            piece_count,
            opening_tags: Vec::new(),
            rating_deviation: None,
            popularity: None,
            nb_plays: None,
            game_url: None,
        }
    }

    pub fn with_themes(mut self, themes: &[&str]) -> Self {
        self.themes = themes.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_opening_tags(mut self, tags: &[&str]) -> Self {
        self.opening_tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn has_opening_tag(&self) -> bool {
        !self.opening_tags.is_empty()
    }

    pub fn has_theme(&self, theme: &str) -> bool {
        self.themes.iter().any(|t| t == theme)
    }

    pub fn difficulty(&self) -> Difficulty {
        Difficulty::from_rating(self.rating)
    }

    pub fn phase(&self) -> GamePhase {
        classify_phase(self.piece_count, self.has_opening_tag(), &self.themes)
    }

    /// Moves the solver has to find (odd indices)
    pub fn solver_moves(&self) -> Vec<&str> {
        self.moves.iter().skip(1).step_by(2).map(String::as_str).collect()
    }

    /// Structural checks that need no board. Move legality is checked when a
    /// session replays the line.
    pub fn check_shape(&self) -> Result<(), PuzzleError> {
        if self.id.trim().is_empty() {
            return Err(PuzzleError::invalid(&self.id, "empty puzzle id"));
        }
        if self.moves.len() < MIN_SOLUTION_LENGTH {
            return Err(PuzzleError::invalid(
                &self.id,
                format!(
                    "solution has {} move(s), need at least {MIN_SOLUTION_LENGTH}",
                    self.moves.len()
                ),
            ));
        }
        Ok(())
    }
}

/// Inclusive rating range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingBand {
    pub min: u16,
    pub max: u16,
}

impl RatingBand {
    pub const ALL: RatingBand = RatingBand { min: 0, max: u16::MAX };

    pub fn contains(&self, rating: u16) -> bool {
        rating >= self.min && rating <= self.max
    }
}

/// Difficulty levels with rating ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Difficulty {
    Beginner = 1,
    Intermediate = 2,
    Advanced = 3,
    Expert = 4,
    Master = 5,
}

impl Difficulty {
    pub const ALL: [Difficulty; 5] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
        Difficulty::Expert,
        Difficulty::Master,
    ];

    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn band(self) -> RatingBand {
        let (min, max) = match self {
            Difficulty::Beginner => (600, 1200),
            Difficulty::Intermediate => (1200, 1600),
            Difficulty::Advanced => (1600, 2000),
            Difficulty::Expert => (2000, 2400),
            Difficulty::Master => (2400, 3000),
        };
        RatingBand { min, max }
    }

    /// Band spanning this level and its neighbours (clamped to 1..=5).
    pub fn widened_band(self) -> RatingBand {
        let lower = Difficulty::ALL[usize::from(self.level().saturating_sub(2))];
        let upper = Difficulty::ALL[usize::from(self.level().min(4))];
        RatingBand {
            min: lower.band().min,
            max: upper.band().max,
        }
    }

    pub fn from_rating(rating: u16) -> Self {
        match rating {
            r if r < 1200 => Difficulty::Beginner,
            r if r < 1600 => Difficulty::Intermediate,
            r if r < 2000 => Difficulty::Advanced,
            r if r < 2400 => Difficulty::Expert,
            _ => Difficulty::Master,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
            Difficulty::Expert => "Expert",
            Difficulty::Master => "Master",
        }
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = PuzzleError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            1..=5 => Ok(Difficulty::ALL[usize::from(level - 1)]),
            _ => Err(PuzzleError::InvalidDifficulty(level)),
        }
    }
}

impl From<Difficulty> for u8 {
    fn from(d: Difficulty) -> u8 {
        d.level()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    Opening,
    Middlegame,
    Endgame,
}

impl GamePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            GamePhase::Opening => "opening",
            GamePhase::Middlegame => "middlegame",
            GamePhase::Endgame => "endgame",
        }
    }

    /// Parse a phase filter; `"any"` means unconstrained.
    pub fn parse_filter(s: &str) -> Result<Option<GamePhase>, PuzzleError> {
        if s.trim().eq_ignore_ascii_case("any") {
            return Ok(None);
        }
        s.parse().map(Some)
    }
}

impl FromStr for GamePhase {
    type Err = PuzzleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "opening" => Ok(GamePhase::Opening),
            "middlegame" => Ok(GamePhase::Middlegame),
            "endgame" => Ok(GamePhase::Endgame),
            _ => Err(PuzzleError::InvalidGamePhase(s.to_string())),
        }
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a puzzle into exactly one phase.
///
/// Precedence: opening, then endgame, then middlegame.
pub fn classify_phase(piece_count: u32, opening_tagged: bool, themes: &[String]) -> GamePhase {
    let has_any = |markers: &[&str]| themes.iter().any(|t| markers.contains(&t.as_str()));

    if opening_tagged || has_any(OPENING_THEMES) {
        GamePhase::Opening
    } else if piece_count < ENDGAME_PIECE_THRESHOLD || has_any(ENDGAME_THEMES) {
        GamePhase::Endgame
    } else {
        GamePhase::Middlegame
    }
}
