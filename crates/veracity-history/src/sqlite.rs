use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tracing::debug;
use veracity_inference::Label;

use crate::{HistoryError, HistoryStore, RecordId, SubmissionRecord, record::SubmissionRow};

const DEFAULT_MAX_CONNECTIONS: u32 = 8;

/// [`HistoryStore`] backed by a SQLite database through a sqlx pool.
///
/// The `AUTOINCREMENT` primary key is the creation marker, so ids are never
/// reused and always grow with insertion order.
#[derive(Debug, Clone)]
pub struct SqliteHistory {
    pool: SqlitePool,
}

impl SqliteHistory {
    /// Open (creating if missing) the database at `url` and apply migrations.
    pub async fn connect(url: &str) -> Result<Self, HistoryError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(DEFAULT_MAX_CONNECTIONS)
            .connect_with(options)
            .await?;
        Self::from_pool(pool).await
    }

    /// A private in-memory database. Contents live as long as the store.
    pub async fn in_memory() -> Result<Self, HistoryError> {
        // The database lives only as long as a connection to it, so the pool
        // holds exactly one and never recycles it.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, applying any pending migrations.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, HistoryError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn into_records(rows: Vec<SubmissionRow>) -> Result<Vec<SubmissionRecord>, HistoryError> {
    rows.into_iter().map(SubmissionRecord::try_from).collect()
}

#[async_trait]
impl HistoryStore for SqliteHistory {
    async fn append(
        &self,
        identity: &str,
        text: &str,
        label: Label,
        confidence: f64,
    ) -> Result<RecordId, HistoryError> {
        if identity.is_empty() {
            return Err(HistoryError::EmptyIdentity);
        }
        let result = sqlx::query(
            "INSERT INTO submissions (identity, text, label, confidence, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(identity)
        .bind(text)
        .bind(label.as_str())
        .bind(confidence)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let id = RecordId(result.last_insert_rowid());
        debug!(%identity, %id, %label, confidence, "Submission recorded");
        Ok(id)
    }

    async fn recent_for(
        &self,
        identity: &str,
        limit: usize,
    ) -> Result<Vec<SubmissionRecord>, HistoryError> {
        let rows: Vec<SubmissionRow> = sqlx::query_as(
            "SELECT id, identity, text, label, confidence, created_at
             FROM submissions WHERE identity = ? ORDER BY id DESC LIMIT ?",
        )
        .bind(identity)
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;
        into_records(rows)
    }

    async fn history_for(&self, identity: &str) -> Result<Vec<SubmissionRecord>, HistoryError> {
        let rows: Vec<SubmissionRow> = sqlx::query_as(
            "SELECT id, identity, text, label, confidence, created_at
             FROM submissions WHERE identity = ? ORDER BY id DESC",
        )
        .bind(identity)
        .fetch_all(&self.pool)
        .await?;
        into_records(rows)
    }

    async fn count_for(&self, identity: &str) -> Result<u64, HistoryError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM submissions WHERE identity = ?")
                .bind(identity)
                .fetch_one(&self.pool)
                .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    async fn store() -> SqliteHistory {
        SqliteHistory::in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn append_is_immediately_newest() {
        let store = store().await;
        store.append("alice", "older", Label::Real, 61.5).await.unwrap();
        let id = store.append("alice", "newest", Label::Fake, 82.0).await.unwrap();

        let recent = store.recent_for("alice", 5).await.unwrap();
        assert_eq!(recent[0].id, id);
        assert_eq!(recent[0].text, "newest");
        assert_eq!(recent[0].label, Label::Fake);
        assert_eq!(recent[0].confidence, 82.0);
        assert_eq!(recent[0].identity, "alice");
    }

    #[tokio::test]
    async fn five_most_recent_of_seven() {
        let store = store().await;
        for i in 0..7 {
            store
                .append("alice", &format!("story {i}"), Label::Real, 50.0 + f64::from(i))
                .await
                .unwrap();
        }

        let recent = store.recent_for("alice", 5).await.unwrap();
        let texts = recent.iter().map(|r| r.text.as_str()).collect::<Vec<_>>();
        assert_eq!(texts, ["story 6", "story 5", "story 4", "story 3", "story 2"]);
        assert!(recent.windows(2).all(|w| w[0].id > w[1].id));
    }

    #[tokio::test]
    async fn unknown_identity_has_empty_history() {
        let store = store().await;
        store.append("alice", "something", Label::Fake, 90.0).await.unwrap();
        assert!(store.recent_for("bob", 5).await.unwrap().is_empty());
        assert!(store.history_for("bob").await.unwrap().is_empty());
        assert_eq!(store.count_for("bob").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn identities_are_isolated_and_limit_is_respected() {
        let store = store().await;
        for i in 0..4 {
            store.append("alice", &format!("a{i}"), Label::Real, 70.0).await.unwrap();
            store.append("bob", &format!("b{i}"), Label::Fake, 80.0).await.unwrap();
        }

        for limit in [0, 1, 3, 10] {
            let recent = store.recent_for("bob", limit).await.unwrap();
            assert!(recent.len() <= limit);
            assert!(recent.iter().all(|r| r.identity == "bob"));
        }
        assert_eq!(store.recent_for("bob", 10).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn full_history_and_count() {
        let store = store().await;
        for i in 0..9 {
            store.append("carol", &format!("c{i}"), Label::Real, 55.0).await.unwrap();
        }
        let all = store.history_for("carol").await.unwrap();
        assert_eq!(all.len(), 9);
        assert_eq!(all[0].text, "c8");
        assert_eq!(all[8].text, "c0");
        assert_eq!(store.count_for("carol").await.unwrap(), 9);
    }

    #[tokio::test]
    async fn empty_text_is_recorded() {
        let store = store().await;
        store.append("dave", "", Label::Real, 50.0).await.unwrap();
        assert_eq!(store.recent_for("dave", 1).await.unwrap()[0].text, "");
    }

    #[tokio::test]
    async fn empty_identity_is_rejected() {
        let store = store().await;
        let err = store.append("", "text", Label::Real, 50.0).await.unwrap_err();
        assert!(matches!(err, HistoryError::EmptyIdentity));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn duplicate_submissions_are_kept() {
        let store = store().await;
        let first = store.append("erin", "same", Label::Fake, 75.0).await.unwrap();
        let second = store.append("erin", "same", Label::Fake, 75.0).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(store.count_for("erin").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn concurrent_appends_keep_per_identity_order() {
        let store = Arc::new(store().await);
        let mut handles = Vec::new();
        for user in ["u1", "u2", "u3"] {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let mut ids = Vec::new();
                for i in 0..10 {
                    ids.push(store.append(user, &format!("{user}-{i}"), Label::Real, 60.0).await.unwrap());
                }
                (user, ids)
            }));
        }

        for handle in handles {
            let (user, mut ids) = handle.await.unwrap();
            let recent = store.recent_for(user, 10).await.unwrap();
            ids.reverse();
            assert_eq!(recent.iter().map(|r| r.id).collect::<Vec<_>>(), ids);
            assert_eq!(recent[0].text, format!("{user}-9"));
        }
    }

    #[tokio::test]
    async fn file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("history.db").display());

        let store = SqliteHistory::connect(&url).await.unwrap();
        let id = store.append("frank", "persisted", Label::Fake, 99.5).await.unwrap();
        store.close().await;

        let reopened = SqliteHistory::connect(&url).await.unwrap();
        let recent = reopened.recent_for("frank", 5).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, id);
        assert_eq!(recent[0].confidence, 99.5);
    }

    #[tokio::test]
    async fn closed_pool_surfaces_storage_error() {
        let store = store().await;
        store.close().await;
        let err = store.append("gina", "lost?", Label::Real, 50.0).await.unwrap_err();
        assert!(matches!(err, HistoryError::Storage(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn corrupt_label_is_reported() {
        let store = store().await;
        // Bypass the CHECK constraint by disabling it for this connection.
        sqlx::query("PRAGMA ignore_check_constraints = ON")
            .execute(store.pool())
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO submissions (identity, text, label, confidence, created_at)
             VALUES ('hal', 'x', 'Maybe', 50.0, ?)",
        )
        .bind(Utc::now())
        .execute(store.pool())
        .await
        .unwrap();
        let err = store.recent_for("hal", 1).await.unwrap_err();
        assert!(matches!(err, HistoryError::CorruptRecord(_)));
    }
}
