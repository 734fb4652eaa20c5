use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    /// The persistence backend rejected or failed a read or write. Safe to retry.
    #[error("history storage failed")]
    Storage(#[from] sqlx::Error),

    #[error("history schema migration failed")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("submitter identity must not be empty")]
    EmptyIdentity,

    #[error("stored submission is corrupt: {0}")]
    CorruptRecord(String),
}

impl HistoryError {
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}
