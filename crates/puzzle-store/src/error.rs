use chess_puzzler::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt puzzle row '{id}': {reason}")]
    Corrupt { id: String, reason: String },
}

impl From<DbError> for StoreError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Sqlite(e) => StoreError::Backend(e.to_string()),
            DbError::Io(e) => StoreError::Io(e),
            DbError::Corrupt { id, reason } => StoreError::Corrupt { id, reason },
        }
    }
}
