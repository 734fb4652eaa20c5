//! # veracity
//!
//! Classifies short news texts as `Fake` or `Real` with a percentage
//! confidence and keeps a per-user history of every submission.
//!
//! A [`Detector`] pairs a read-only [`ModelBundle`] (TF-IDF vectorizer plus a
//! pre-trained classifier) with a [`HistoryStore`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use veracity::{Detector, DetectorConfig};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let detector = Detector::open("model.bin", "sqlite://veracity.db", DetectorConfig::default()).await?;
//!
//! let result = detector.classify("alice", "Scientists confirm the moon is made of cheese").await?;
//! println!("{} ({:.2}%)", result.label, result.confidence);
//!
//! for record in detector.recent("alice").await? {
//!     println!("{} {} {}", record.created_at, record.label, record.text);
//! }
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "cli")]
pub mod cli;

mod config;
mod error;

use std::{path::Path, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
pub use config::{DEFAULT_DATABASE_URL, DEFAULT_HISTORY_LIMIT, DetectorConfig};
pub use error::DetectError;
pub use veracity_history::{HistoryError, HistoryStore, RecordId, SqliteHistory, SubmissionRecord};
pub use veracity_inference::{Label, ModelBundle, ModelError, Resolution};
use veracity_inference::pipeline;

/// Outcome of a recorded classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub record_id: RecordId,
    pub label: Label,
    /// Winning-class probability as a percentage, two decimals.
    pub confidence: f64,
}

/// Runs the classification pipeline and records every result.
///
/// Recording is part of the unit of work: if the history write fails the
/// caller gets [`DetectError::Storage`] and no result.
pub struct Detector {
    bundle: Arc<ModelBundle>,
    store: Arc<dyn HistoryStore>,
    config: DetectorConfig,
}

impl Detector {
    /// Assemble a detector from an already-loaded bundle and store.
    ///
    /// Runs [`ModelBundle::validate`] once, so a misconfigured model is
    /// rejected here rather than per request.
    pub fn new(
        bundle: Arc<ModelBundle>,
        store: Arc<dyn HistoryStore>,
        config: DetectorConfig,
    ) -> Result<Self, DetectError> {
        bundle.validate()?;

        Ok(Self {
            bundle,
            store,
            config,
        })
    }

    /// Load the bundle from `model_path`, connect the SQLite history at
    /// `database_url` and assemble a detector.
    pub async fn open(
        model_path: impl AsRef<Path>,
        database_url: &str,
        config: DetectorConfig,
    ) -> Result<Self, DetectError> {
        let bundle = ModelBundle::load(model_path)?;
        let store = SqliteHistory::connect(database_url).await?;
        info!(
            model_version = bundle.model_version(),
            history_limit = config.history_limit,
            "Detector ready"
        );
        Self::new(Arc::new(bundle), Arc::new(store), config)
    }

    #[must_use]
    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    #[must_use]
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Classify `text` without recording it.
    #[must_use]
    pub fn predict(&self, text: &str) -> Resolution {
        pipeline::detect(&self.bundle, text)
    }

    /// Classify `text` on behalf of `identity` and record the outcome.
    ///
    /// Any string is accepted, including the empty string. Identical calls
    /// produce distinct records.
    pub async fn classify(&self, identity: &str, text: &str) -> Result<DetectionResult, DetectError> {
        let resolution = self.predict(text);
        debug!(%identity, %resolution, "Text classified");

        let record_id = self
            .store
            .append(identity, text, resolution.label, resolution.confidence)
            .await?;

        Ok(DetectionResult {
            record_id,
            label: resolution.label,
            confidence: resolution.confidence,
        })
    }

    /// At most `limit` records for `identity`, newest first.
    pub async fn recent_for(
        &self,
        identity: &str,
        limit: usize,
    ) -> Result<Vec<SubmissionRecord>, DetectError> {
        Ok(self.store.recent_for(identity, limit).await?)
    }

    /// The configured number of most recent records for `identity`.
    pub async fn recent(&self, identity: &str) -> Result<Vec<SubmissionRecord>, DetectError> {
        self.recent_for(identity, self.config.history_limit).await
    }

    /// Every record for `identity`, newest first.
    pub async fn history_for(&self, identity: &str) -> Result<Vec<SubmissionRecord>, DetectError> {
        Ok(self.store.history_for(identity).await?)
    }
}
