use thiserror::Error;

use crate::models::ValidationError;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlite(#[from] tokio_rusqlite::rusqlite::Error),

    #[error("database connection error: {0}")]
    Connection(#[from] tokio_rusqlite::Error),

    #[error("invalid entity: {0}")]
    InvalidEntity(#[from] ValidationError),

    #[error("a player with that name already exists in that location")]
    PlayerExists,

    #[error("player not found")]
    PlayerNotFound,

    #[error("api key not found")]
    KeyNotFound,
}

pub type Result<T> = std::result::Result<T, DbError>;
