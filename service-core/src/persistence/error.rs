use std::time::Duration;
use thiserror::Error;

/// Failures raised by the persistence layer. They are returned untranslated;
/// domain services decide what they mean.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("session is already inside a unit of work")]
    NestedTransaction,

    #[error("transaction is busy with another statement or an open cursor")]
    TransactionBusy,

    #[error("transaction is still referenced after the unit of work returned")]
    TransactionInUse,

    #[error("unit of work timed out after {0:?}")]
    Timeout(Duration),
}

impl DbError {
    /// True when the database rejected a write for breaking a unique constraint.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::Sqlx(sqlx::Error::Database(e)) if e.is_unique_violation())
    }
}
