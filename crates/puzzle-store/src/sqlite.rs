//! SQLite-backed puzzle corpus.
//!
//! Schema: `puzzles` (one row per puzzle, moves space-separated, opening
//! tags comma-separated), `themes` and the `puzzle_themes` junction table.
//! Candidate queries are translated to SQL with the phase rule expressed as
//! SQL predicates, then re-checked against `CandidateQuery::matches` so the
//! store can never disagree with the in-memory reference.

use std::collections::HashSet;
use std::path::Path;

use chess_puzzler::puzzle::themes::{ENDGAME_PIECE_THRESHOLD, ENDGAME_THEMES, OPENING_THEMES};
use chess_puzzler::{CandidateQuery, GamePhase, PuzzleRecord, PuzzleStore, StoreError};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::{debug, info, warn};

use crate::error::DbError;

/// Upper bound on rows pulled per candidate query.
pub const DEFAULT_CANDIDATE_LIMIT: usize = 64;

const PUZZLE_COLUMNS: &str = "p.puzzle_id, p.fen, p.moves, p.rating, p.rating_deviation, \
     p.popularity, p.nb_plays, p.game_url, p.opening_tags, p.piece_count";

pub struct SqlitePuzzleStore {
    conn: Connection,
    candidate_limit: usize,
}

/// Raw `puzzles` row before conversion.
struct PuzzleRow {
    id: String,
    fen: String,
    moves: String,
    rating: i64,
    rating_deviation: Option<i64>,
    popularity: Option<i64>,
    nb_plays: Option<i64>,
    game_url: Option<String>,
    opening_tags: Option<String>,
    piece_count: Option<i64>,
}

impl PuzzleRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            fen: row.get(1)?,
            moves: row.get(2)?,
            rating: row.get(3)?,
            rating_deviation: row.get(4)?,
            popularity: row.get(5)?,
            nb_plays: row.get(6)?,
            game_url: row.get(7)?,
            opening_tags: row.get(8)?,
            piece_count: row.get(9)?,
        })
    }

    fn into_record(self, themes: Vec<String>) -> Result<PuzzleRecord, DbError> {
        let corrupt = |reason: String| DbError::Corrupt {
            id: self.id.clone(),
            reason,
        };

        let rating = u16::try_from(self.rating)
            .map_err(|_| corrupt(format!("rating {} out of range", self.rating)))?;
        let piece_count = self
            .piece_count
            .ok_or_else(|| corrupt("missing piece count".to_string()))
            .and_then(|n| {
                u32::try_from(n).map_err(|_| corrupt(format!("piece count {n} out of range")))
            })?;

        Ok(PuzzleRecord {
            moves: self.moves.split_whitespace().map(str::to_string).collect(),
            rating,
            themes,
            piece_count,
            opening_tags: self
                .opening_tags
                .as_deref()
                .map(split_tags)
                .unwrap_or_default(),
            rating_deviation: self.rating_deviation.and_then(|v| u16::try_from(v).ok()),
            popularity: self.popularity.and_then(|v| i32::try_from(v).ok()),
            nb_plays: self.nb_plays.and_then(|v| u32::try_from(v).ok()),
            game_url: self.game_url,
            fen: self.fen,
            id: self.id,
        })
    }
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn quoted_list(names: &[&str]) -> String {
    names
        .iter()
        .map(|n| format!("'{}'", n.replace('\'', "''")))
        .collect::<Vec<_>>()
        .join(", ")
}

fn has_theme_in(names: &[&str]) -> String {
    format!(
        "EXISTS (SELECT 1 FROM puzzle_themes pt JOIN themes t ON t.theme_id = pt.theme_id \
         WHERE pt.puzzle_id = p.puzzle_id AND t.theme_name IN ({}))",
        quoted_list(names)
    )
}

/// SQL predicate for one phase, with opening taking precedence over endgame.
fn phase_clause(phase: GamePhase) -> String {
    let opening = format!(
        "(COALESCE(p.opening_tags, '') != '' OR {})",
        has_theme_in(OPENING_THEMES)
    );
    let endgame = format!(
        "(p.piece_count < {ENDGAME_PIECE_THRESHOLD} OR {})",
        has_theme_in(ENDGAME_THEMES)
    );

    match phase {
        GamePhase::Opening => opening,
        GamePhase::Endgame => format!("(NOT {opening} AND {endgame})"),
        GamePhase::Middlegame => format!("(NOT {opening} AND NOT {endgame})"),
    }
}

impl SqlitePuzzleStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        info!("Opening puzzle database at {}", path.display());
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, DbError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, DbError> {
        let store = Self {
            conn,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
        };
        store.create_schema()?;
        Ok(store)
    }

    pub fn with_candidate_limit(mut self, limit: usize) -> Self {
        self.candidate_limit = limit.max(1);
        self
    }

    fn create_schema(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS puzzles (
                puzzle_id TEXT PRIMARY KEY,
                fen TEXT NOT NULL,
                moves TEXT NOT NULL,
                rating INTEGER NOT NULL,
                rating_deviation INTEGER,
                popularity INTEGER,
                nb_plays INTEGER,
                game_url TEXT,
                opening_tags TEXT,
                piece_count INTEGER
            );
            CREATE TABLE IF NOT EXISTS themes (
                theme_id INTEGER PRIMARY KEY AUTOINCREMENT,
                theme_name TEXT UNIQUE NOT NULL
            );
            CREATE TABLE IF NOT EXISTS puzzle_themes (
                puzzle_id TEXT,
                theme_id INTEGER,
                PRIMARY KEY (puzzle_id, theme_id),
                FOREIGN KEY (puzzle_id) REFERENCES puzzles(puzzle_id),
                FOREIGN KEY (theme_id) REFERENCES themes(theme_id)
            );
            CREATE INDEX IF NOT EXISTS idx_rating ON puzzles(rating);
            CREATE INDEX IF NOT EXISTS idx_piece_count ON puzzles(piece_count);
            CREATE INDEX IF NOT EXISTS idx_theme_name ON themes(theme_name);
            "#,
        )?;
        Ok(())
    }

    /// Insert or replace one puzzle together with its theme links.
    pub fn insert_puzzle(&mut self, puzzle: &PuzzleRecord) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;

        tx.execute(
            r#"INSERT OR REPLACE INTO puzzles (puzzle_id, fen, moves, rating, rating_deviation,
                   popularity, nb_plays, game_url, opening_tags, piece_count)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"#,
            params![
                puzzle.id,
                puzzle.fen,
                puzzle.moves.join(" "),
                puzzle.rating,
                puzzle.rating_deviation,
                puzzle.popularity,
                puzzle.nb_plays,
                puzzle.game_url,
                puzzle.opening_tags.join(","),
                puzzle.piece_count,
            ],
        )?;

        tx.execute(
            "DELETE FROM puzzle_themes WHERE puzzle_id = ?1",
            params![puzzle.id],
        )?;
        for theme in &puzzle.themes {
            tx.execute(
                "INSERT OR IGNORE INTO themes (theme_name) VALUES (?1)",
                params![theme],
            )?;
            tx.execute(
                r#"INSERT OR IGNORE INTO puzzle_themes (puzzle_id, theme_id)
                   SELECT ?1, theme_id FROM themes WHERE theme_name = ?2"#,
                params![puzzle.id, theme],
            )?;
        }

        tx.commit()?;
        debug!(puzzle_id = %puzzle.id, themes = puzzle.themes.len(), "Puzzle stored");
        Ok(())
    }

    pub fn puzzle_count(&self) -> Result<usize, DbError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM puzzles", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn themes_of(&self, puzzle_id: &str) -> Result<Vec<String>, DbError> {
        let mut stmt = self.conn.prepare_cached(
            r#"SELECT t.theme_name FROM puzzle_themes pt
               JOIN themes t ON t.theme_id = pt.theme_id
               WHERE pt.puzzle_id = ?1
               ORDER BY pt.rowid"#,
        )?;
        let themes = stmt
            .query_map(params![puzzle_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(themes)
    }

    /// Replace the connection's excluded-id scratch table with `ids`.
    /// The set has no size bound, so it is joined instead of bound as parameters.
    fn load_excluded(&self, ids: &HashSet<String>) -> Result<(), DbError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch(
            "CREATE TEMP TABLE IF NOT EXISTS excluded_ids (puzzle_id TEXT PRIMARY KEY);
             DELETE FROM temp.excluded_ids;",
        )?;
        {
            let mut insert =
                tx.prepare_cached("INSERT OR IGNORE INTO temp.excluded_ids (puzzle_id) VALUES (?1)")?;
            for id in ids {
                insert.execute(params![id])?;
            }
        }
        tx.commit()?;
        debug!(excluded = ids.len(), "Loaded exclusion set");
        Ok(())
    }

    fn query_candidates(&self, query: &CandidateQuery<'_>) -> Result<Vec<PuzzleRecord>, DbError> {
        let mut sql = format!("SELECT {PUZZLE_COLUMNS} FROM puzzles p WHERE p.rating BETWEEN ? AND ?");
        let mut values: Vec<Value> = vec![
            Value::Integer(i64::from(query.rating.min)),
            Value::Integer(i64::from(query.rating.max)),
        ];

        if let Some(phase) = query.phase {
            sql.push_str(" AND ");
            sql.push_str(&phase_clause(phase));
        }

        if let Some(theme) = query.theme {
            sql.push_str(
                " AND EXISTS (SELECT 1 FROM puzzle_themes pt JOIN themes t ON t.theme_id = pt.theme_id \
                 WHERE pt.puzzle_id = p.puzzle_id AND t.theme_name = ?)",
            );
            values.push(Value::Text(theme.to_string()));
        }

        if let Some(exclude) = query.exclude.filter(|ids| !ids.is_empty()) {
            self.load_excluded(exclude)?;
            sql.push_str(
                " AND NOT EXISTS (SELECT 1 FROM temp.excluded_ids x WHERE x.puzzle_id = p.puzzle_id)",
            );
        }

        sql.push_str(" ORDER BY RANDOM() LIMIT ?");
        values.push(Value::Integer(
            i64::try_from(self.candidate_limit).unwrap_or(i64::MAX),
        ));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), PuzzleRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut candidates = Vec::with_capacity(rows.len());
        for row in rows {
            let themes = self.themes_of(&row.id)?;
            match row.into_record(themes) {
                Ok(puzzle) => candidates.push(puzzle),
                Err(e) => warn!("Skipping corrupt puzzle row: {e}"),
            }
        }
        candidates.retain(|p| query.matches(p));
        Ok(candidates)
    }
}

impl PuzzleStore for SqlitePuzzleStore {
    fn find_candidates(&self, query: &CandidateQuery<'_>) -> Result<Vec<PuzzleRecord>, StoreError> {
        Ok(self.query_candidates(query)?)
    }

    fn corpus_empty(&self) -> Result<bool, StoreError> {
        let any: bool = self
            .conn
            .query_row("SELECT EXISTS (SELECT 1 FROM puzzles)", [], |row| row.get(0))
            .map_err(DbError::from)?;
        Ok(!any)
    }

    fn find_by_id(&self, id: &str) -> Result<Option<PuzzleRecord>, StoreError> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {PUZZLE_COLUMNS} FROM puzzles p WHERE p.puzzle_id = ?1"),
                params![id],
                PuzzleRow::from_row,
            )
            .optional()
            .map_err(DbError::from)?;

        match row {
            Some(row) => {
                let themes = self.themes_of(&row.id)?;
                Ok(Some(row.into_record(themes)?))
            }
            None => Ok(None),
        }
    }

    fn theme_counts(&self, limit: usize) -> Result<Vec<(String, usize)>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                r#"SELECT t.theme_name, COUNT(DISTINCT pt.puzzle_id) AS count
                   FROM themes t
                   JOIN puzzle_themes pt ON t.theme_id = pt.theme_id
                   GROUP BY t.theme_name
                   ORDER BY count DESC, t.theme_name ASC
                   LIMIT ?1"#,
            )
            .map_err(DbError::from)?;

        let counts = stmt
            .query_map(params![i64::try_from(limit).unwrap_or(i64::MAX)], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })
            .map_err(DbError::from)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(DbError::from)?;

        Ok(counts
            .into_iter()
            .map(|(theme, n)| (theme, usize::try_from(n).unwrap_or(0)))
            .collect())
    }
}
