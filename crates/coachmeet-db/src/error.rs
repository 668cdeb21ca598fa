use rusqlite::ErrorCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    /// UNIQUE, FOREIGN KEY or NOT NULL rejected by the storage layer.
    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("invalid meet date {input:?} (expected YYYY-MM-DD HH:MM:SS)")]
    InvalidMeetDate {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error("storage error: {0}")]
    Storage(#[source] rusqlite::Error),
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(failure, message)
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                DbError::Constraint(message.unwrap_or_else(|| failure.to_string()))
            }
            other => DbError::Storage(other),
        }
    }
}

impl DbError {
    pub fn is_constraint(&self) -> bool {
        matches!(self, DbError::Constraint(_))
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn storage_error_keeps_its_source() {
        let err = DbError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(matches!(err, DbError::Storage(_)));
        let source = err.source().expect("storage errors expose the rusqlite cause");
        assert_eq!(source.to_string(), rusqlite::Error::QueryReturnedNoRows.to_string());
    }
}
