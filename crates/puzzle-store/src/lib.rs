//! Storage adapters for the puzzle trainer: a SQLite puzzle corpus and a
//! JSON-file attempt history.

pub mod error;
pub mod progress_file;
pub mod sqlite;

pub use error::DbError;
pub use progress_file::JsonProgressStore;
pub use sqlite::SqlitePuzzleStore;
