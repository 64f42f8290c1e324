use sea_orm::{DbErr, SqlErr};

/// Errors surfaced by the repository layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    /// A unique or foreign key constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// SQLite reported lock contention; the caller may retry.
    #[error("Database is busy: {0}")]
    Busy(String),

    #[error("Database error: {0}")]
    Database(#[source] DbErr),

    #[error("{0}")]
    Internal(String),
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => return Self::Conflict(msg),
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => return Self::Conflict(msg),
            _ => {}
        }

        if is_lock_contention(&err) {
            return Self::Busy(err.to_string());
        }

        Self::Database(err)
    }
}

/// Whether the store rejected the statement because another writer holds the lock.
#[must_use]
pub fn is_lock_contention(err: &DbErr) -> bool {
    let message = err.to_string().to_ascii_lowercase();
    message.contains("database is locked") || message.contains("database table is locked")
}
