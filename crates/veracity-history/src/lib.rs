//! Submission history for veracity.
//!
//! Every successful classification is appended as an immutable
//! [`SubmissionRecord`]; reads return a bounded, newest-first view for one
//! submitter identity.

mod error;
mod record;
mod sqlite;
mod store;

pub use error::HistoryError;
pub use record::{RecordId, SubmissionRecord};
pub use sqlite::SqliteHistory;
pub use store::HistoryStore;
