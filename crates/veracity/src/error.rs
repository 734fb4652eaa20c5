use thiserror::Error;
use veracity_history::HistoryError;
use veracity_inference::ModelError;

#[derive(Debug, Error)]
pub enum DetectError {
    /// The model bundle is missing or unreadable; the service must not start.
    #[error("model bundle is unavailable")]
    ModelUnavailable(#[source] ModelError),

    /// The model bundle loaded but its parts disagree; the service must not start.
    #[error("model bundle is misconfigured")]
    Configuration(#[source] ModelError),

    /// Submission history could not be read or written.
    #[error("submission history is unavailable")]
    Storage(#[from] HistoryError),
}

impl DetectError {
    /// Only storage failures are worth retrying; the other kinds are fatal at startup.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_retryable())
    }
}

impl From<ModelError> for DetectError {
    fn from(error: ModelError) -> Self {
        if error.is_configuration() {
            Self::Configuration(error)
        } else {
            Self::ModelUnavailable(error)
        }
    }
}
