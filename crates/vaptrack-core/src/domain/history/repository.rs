//! History repository for database operations
//!
//! Pure append and read access to the transition log. Transition legality
//! is the workflow engine's concern; nothing is validated here.

use super::event::HistoryEvent;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;
use uuid::Uuid;

/// Repository for the append-only transition log
#[derive(Debug, Clone)]
pub struct HistoryRepository {
    pool: SqlitePool,
}

impl HistoryRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append an event to the log
    pub async fn record(&self, event: &HistoryEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO feature_history (id, feature_key, old_status, new_status, actor, note, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.id.to_string())
        .bind(&event.feature_key)
        .bind(&event.old_status)
        .bind(&event.new_status)
        .bind(&event.actor)
        .bind(&event.note)
        .bind(event.created_at)
        .execute(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        Ok(())
    }

    /// Get all events for a feature, newest first.
    ///
    /// Returns an empty list (not an error) for a feature with no events.
    pub async fn get_history(&self, feature_key: &str) -> Result<Vec<HistoryEvent>> {
        let rows: Vec<HistoryEventRow> = sqlx::query_as(
            r#"
            SELECT id, feature_key, old_status, new_status, actor, note, created_at
            FROM feature_history
            WHERE feature_key = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(feature_key)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        rows.into_iter().map(|row| row.into_event()).collect()
    }

    /// Count events for one feature
    pub async fn count_for(&self, feature_key: &str) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM feature_history WHERE feature_key = ?")
                .bind(feature_key)
                .fetch_one(&self.pool)
                .await
                .map_err(Error::DatabaseError)?;

        Ok(count)
    }

    /// Event counts for all features in one grouped query.
    ///
    /// Used by the catalog merge to derive `has_history` without a
    /// per-feature lookup.
    pub async fn counts_by_feature(&self) -> Result<HashMap<String, i64>> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT feature_key, COUNT(*) FROM feature_history GROUP BY feature_key")
                .fetch_all(&self.pool)
                .await
                .map_err(Error::DatabaseError)?;

        Ok(rows.into_iter().collect())
    }
}

/// Database row for a history event
#[derive(sqlx::FromRow)]
struct HistoryEventRow {
    id: String,
    feature_key: String,
    old_status: String,
    new_status: String,
    actor: String,
    note: String,
    created_at: DateTime<Utc>,
}

impl HistoryEventRow {
    fn into_event(self) -> Result<HistoryEvent> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| Error::Parse(format!("Invalid event ID: {}", e)))?;

        Ok(HistoryEvent {
            id,
            feature_key: self.feature_key,
            old_status: self.old_status,
            new_status: self.new_status,
            actor: self.actor,
            note: self.note,
            created_at: self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    async fn create_test_repo() -> HistoryRepository {
        let db = Database::in_memory()
            .await
            .expect("Failed to create test database");
        HistoryRepository::new(db.pool().clone())
    }

    #[tokio::test]
    async fn test_record_and_read_back() {
        let repo = create_test_repo().await;

        let event = HistoryEvent::new("xss-protection", "Draft", "Develop", "alice", "start work");
        repo.record(&event).await.expect("Failed to record");

        let events = repo.get_history("xss-protection").await.expect("Failed to read");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, event.id);
        assert_eq!(events[0].old_status, "Draft");
        assert_eq!(events[0].new_status, "Develop");
        assert_eq!(events[0].actor, "alice");
        assert_eq!(events[0].note, "start work");
    }

    #[tokio::test]
    async fn test_empty_history_is_not_an_error() {
        let repo = create_test_repo().await;

        let events = repo.get_history("never-touched").await.expect("Failed to read");
        assert!(events.is_empty());
        assert_eq!(repo.count_for("never-touched").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_history_is_newest_first() {
        let repo = create_test_repo().await;

        for (i, to) in ["Develop", "Test", "Release"].iter().enumerate() {
            let mut event = HistoryEvent::new("csrf-guard", "x", *to, "alice", "");
            // Distinct timestamps so the ordering is observable
            event.created_at = Utc::now() + chrono::Duration::seconds(i as i64);
            repo.record(&event).await.unwrap();
        }

        let events = repo.get_history("csrf-guard").await.unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].new_status, "Release");
        assert_eq!(events[2].new_status, "Develop");
        for pair in events.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }
    }

    #[tokio::test]
    async fn test_counts_by_feature_grouped() {
        let repo = create_test_repo().await;

        for _ in 0..3 {
            repo.record(&HistoryEvent::new("a", "Draft", "Develop", "t", ""))
                .await
                .unwrap();
        }
        repo.record(&HistoryEvent::new("b", "Draft", "Develop", "t", ""))
            .await
            .unwrap();

        let counts = repo.counts_by_feature().await.unwrap();
        assert_eq!(counts.get("a"), Some(&3));
        assert_eq!(counts.get("b"), Some(&1));
        assert_eq!(counts.get("c"), None);
    }
}
