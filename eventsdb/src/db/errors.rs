use thiserror::Error;

/// Unified error type for database operations.
///
/// The three variants match the three ways an operation can go wrong:
/// the connection could not be opened at all, a statement failed once a
/// connection existed, or the statement ran fine but the target event does
/// not exist. Only the first two are eligible for fallback recovery; a
/// missing event is a caller error and is always surfaced.
#[derive(Error, Debug)]
pub enum DbError {
    /// No event with the given id, in the database or the memory store.
    #[error("event not found")]
    NotFound,

    /// A connection to the database could not be established.
    #[error("database unavailable")]
    Unavailable(#[source] sqlx::Error),

    /// A statement failed after a connection was established.
    #[error("query failed")]
    Query(#[source] sqlx::Error),
}

impl DbError {
    /// Whether the fallback store may answer in place of this failure.
    pub fn recoverable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Query(_))
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound,
            err => Self::Query(err),
        }
    }
}

/// Type alias for database operation results
pub type Result<T> = std::result::Result<T, DbError>;
