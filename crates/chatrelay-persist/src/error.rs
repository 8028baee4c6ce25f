use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid stored row: {0}")]
    InvalidRow(String),
}

pub type Result<T> = std::result::Result<T, PersistError>;
