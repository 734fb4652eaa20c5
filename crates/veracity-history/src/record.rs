use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use veracity_inference::Label;

use crate::HistoryError;

/// Storage-assigned creation marker. Larger ids were written later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One classification event, immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: RecordId,
    pub identity: String,
    pub text: String,
    pub label: Label,
    /// Winning-class probability as a percentage, two decimals.
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

/// Row type for sqlx deserialization from the `submissions` table.
#[derive(sqlx::FromRow)]
pub(crate) struct SubmissionRow {
    id: i64,
    identity: String,
    text: String,
    label: String,
    confidence: f64,
    created_at: DateTime<Utc>,
}

impl TryFrom<SubmissionRow> for SubmissionRecord {
    type Error = HistoryError;

    fn try_from(row: SubmissionRow) -> Result<Self, Self::Error> {
        let label = row
            .label
            .parse::<Label>()
            .map_err(|e| HistoryError::CorruptRecord(format!("record {}: {e}", row.id)))?;
        Ok(Self {
            id: RecordId(row.id),
            identity: row.identity,
            text: row.text,
            label,
            confidence: row.confidence,
            created_at: row.created_at,
        })
    }
}
