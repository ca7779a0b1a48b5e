//! Theme markers used for phase classification, and the theme catalog
//! shown to players when picking a theme filter.

/// Fewer pieces than this on the board counts as an endgame
pub const ENDGAME_PIECE_THRESHOLD: u32 = 12;

/// Themes that mark a puzzle as an endgame puzzle
pub const ENDGAME_THEMES: &[&str] = &[
    "endgame",
    "mateIn1",
    "mateIn2",
    "mateIn3",
    "mateIn4",
    "mateIn5",
    "promotion",
    "queenEndgame",
    "rookEndgame",
    "bishopEndgame",
    "knightEndgame",
    "pawnEndgame",
];

/// Themes that mark a puzzle as an opening puzzle
pub const OPENING_THEMES: &[&str] = &["opening", "openingVariation", "trap"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemeCategory {
    Tactical,
    Checkmate,
    Strategic,
    SpecialMove,
}

impl ThemeCategory {
    pub const ALL: [ThemeCategory; 4] = [
        ThemeCategory::Tactical,
        ThemeCategory::Checkmate,
        ThemeCategory::Strategic,
        ThemeCategory::SpecialMove,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ThemeCategory::Tactical => "Tactical Patterns",
            ThemeCategory::Checkmate => "Checkmate Patterns",
            ThemeCategory::Strategic => "Strategic",
            ThemeCategory::SpecialMove => "Special Moves",
        }
    }
}

/// (theme, category, description)
pub const THEME_CATALOG: &[(&str, ThemeCategory, &str)] = &[
    ("fork", ThemeCategory::Tactical, "Attack two or more pieces simultaneously"),
    ("pin", ThemeCategory::Tactical, "Piece cannot move without exposing a more valuable piece"),
    ("skewer", ThemeCategory::Tactical, "Force a valuable piece to move, exposing a less valuable piece"),
    ("discoveredAttack", ThemeCategory::Tactical, "Moving a piece reveals an attack from another piece"),
    ("doubleCheck", ThemeCategory::Tactical, "Check from two pieces simultaneously"),
    ("attraction", ThemeCategory::Tactical, "Force enemy piece to a bad square"),
    ("deflection", ThemeCategory::Tactical, "Force piece away from defending something"),
    ("interference", ThemeCategory::Tactical, "Block line between two enemy pieces"),
    ("removeDefender", ThemeCategory::Tactical, "Eliminate or distract a defending piece"),
    ("sacrifice", ThemeCategory::Tactical, "Give up material for tactical advantage"),
    ("zugzwang", ThemeCategory::Tactical, "Any move worsens your position"),
    ("clearance", ThemeCategory::Tactical, "Clear a square or line for own piece"),
    ("xRayAttack", ThemeCategory::Tactical, "Attack through an enemy piece"),
    ("mateIn1", ThemeCategory::Checkmate, "Checkmate in one move"),
    ("mateIn2", ThemeCategory::Checkmate, "Checkmate in two moves"),
    ("mateIn3", ThemeCategory::Checkmate, "Checkmate in three moves"),
    ("mateIn4", ThemeCategory::Checkmate, "Checkmate in four moves"),
    ("mateIn5", ThemeCategory::Checkmate, "Checkmate in five or more moves"),
    ("backRankMate", ThemeCategory::Checkmate, "Checkmate on the back rank"),
    ("anastasiaMate", ThemeCategory::Checkmate, "Knight and rook trap the king on the edge"),
    ("arabianMate", ThemeCategory::Checkmate, "Knight and rook mate the king in the corner"),
    ("doubleBishopMate", ThemeCategory::Checkmate, "Two bishops deliver mate"),
    ("dovetailMate", ThemeCategory::Checkmate, "Queen mates a king boxed in by its own pieces"),
    ("smotheredMate", ThemeCategory::Checkmate, "Knight mates a king blocked by its own pieces"),
    ("hookMate", ThemeCategory::Checkmate, "Rook, knight and pawn mating net"),
    ("advantage", ThemeCategory::Strategic, "Gain significant advantage"),
    ("crushing", ThemeCategory::Strategic, "Overwhelming advantage"),
    ("quietMove", ThemeCategory::Strategic, "Subtle but strong move"),
    ("defensiveMove", ThemeCategory::Strategic, "Strong defensive resource"),
    ("equality", ThemeCategory::Strategic, "Reach equal position from worse"),
    ("attackingF2F7", ThemeCategory::Strategic, "Attack on f2 or f7 square"),
    ("capturingDefender", ThemeCategory::Strategic, "Capture piece that was defending"),
    ("castling", ThemeCategory::SpecialMove, "Castling is the key move"),
    ("enPassant", ThemeCategory::SpecialMove, "En passant capture"),
    ("promotion", ThemeCategory::SpecialMove, "Pawn promotion"),
    ("underPromotion", ThemeCategory::SpecialMove, "Promote to piece other than queen"),
];

pub fn describe(theme: &str) -> Option<&'static str> {
    THEME_CATALOG
        .iter()
        .find(|(name, _, _)| *name == theme)
        .map(|(_, _, description)| *description)
}

pub fn themes_in(category: ThemeCategory) -> Vec<&'static str> {
    THEME_CATALOG
        .iter()
        .filter(|(_, c, _)| *c == category)
        .map(|(name, _, _)| *name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_known_and_unknown() {
        assert_eq!(describe("fork"), Some("Attack two or more pieces simultaneously"));
        assert_eq!(describe("notATheme"), None);
    }

    #[test]
    fn test_every_catalog_theme_has_a_listed_category() {
        let listed: usize = ThemeCategory::ALL.iter().map(|c| themes_in(*c).len()).sum();
        assert_eq!(listed, THEME_CATALOG.len());
    }

    #[test]
    fn test_themes_in_category() {
        let special = themes_in(ThemeCategory::SpecialMove);
        assert_eq!(special, vec!["castling", "enPassant", "promotion", "underPromotion"]);
    }
}
