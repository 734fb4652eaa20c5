use serde::{Deserialize, Serialize};

/// Number of records shown in a history view unless asked otherwise.
pub const DEFAULT_HISTORY_LIMIT: usize = 5;

/// Database used when none is configured.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://veracity.db";

/// Tunables for a [`crate::Detector`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Records returned by [`crate::Detector::recent`].
    pub history_limit: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl DetectorConfig {
    #[must_use]
    pub fn with_history_limit(mut self, history_limit: usize) -> Self {
        self.history_limit = history_limit;
        self
    }
}
