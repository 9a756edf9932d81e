//! Database error types.

use thiserror::Error;
use vocab_core::StoreError;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("lock poisoned")]
    Poisoned,

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl From<DbError> for StoreError {
    fn from(e: DbError) -> Self {
        StoreError::Backend(e.to_string())
    }
}
