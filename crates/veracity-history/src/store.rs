use async_trait::async_trait;
use veracity_inference::Label;

use crate::{HistoryError, RecordId, SubmissionRecord};

/// Durable, per-identity log of classification events.
///
/// A record written by `append` is visible to `recent_for` for the same
/// identity as soon as `append` returns. Ordering is only defined within one
/// identity.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Write a new record and return its creation marker.
    async fn append(
        &self,
        identity: &str,
        text: &str,
        label: Label,
        confidence: f64,
    ) -> Result<RecordId, HistoryError>;

    /// At most `limit` records for `identity`, newest first.
    async fn recent_for(
        &self,
        identity: &str,
        limit: usize,
    ) -> Result<Vec<SubmissionRecord>, HistoryError>;

    /// Every record for `identity`, newest first.
    async fn history_for(&self, identity: &str) -> Result<Vec<SubmissionRecord>, HistoryError>;

    async fn count_for(&self, identity: &str) -> Result<u64, HistoryError>;
}
