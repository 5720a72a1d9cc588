//! Workflow engine: validates and applies lifecycle transitions
//!
//! A transition is a single read-modify-write unit: the current-status
//! read, the status upsert and the history append all happen inside one
//! transaction, so concurrent callers cannot validate against a stale
//! status and a failed call never leaves a partial write.

use crate::domain::workflow::status::FeatureStatus;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Validates and applies lifecycle transitions for features
#[derive(Debug, Clone)]
pub struct WorkflowEngine {
    pool: SqlitePool,
}

impl WorkflowEngine {
    /// Create a new engine on the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Transition a feature to a new status.
    ///
    /// A feature with no status row is treated as `Draft`. The requested
    /// status may use any casing or a legacy alias; the canonical spelling
    /// is persisted while the history row keeps the stored old status and
    /// the caller's literal new status for audit fidelity.
    ///
    /// Transitioning to the current status is always legal. Such a
    /// self-loop records a history entry only when `note` is non-empty.
    pub async fn transition(
        &self,
        feature_key: &str,
        new_status: &str,
        note: &str,
        actor: &str,
    ) -> Result<()> {
        if feature_key.is_empty() {
            return Err(Error::InvalidInput("feature key must not be empty".to_string()));
        }

        let target = FeatureStatus::normalize(new_status)
            .ok_or_else(|| Error::UnknownStatus(new_status.to_string()))?;

        let mut tx = self.pool.begin().await?;

        let row: Option<(String,)> =
            sqlx::query_as("SELECT status FROM feature_status WHERE feature_key = ?")
                .bind(feature_key)
                .fetch_optional(&mut *tx)
                .await?;

        let old_literal = row
            .map(|(s,)| s)
            .unwrap_or_else(|| FeatureStatus::Draft.as_str().to_string());
        let current = FeatureStatus::normalize(&old_literal).ok_or_else(|| {
            Error::Parse(format!(
                "stored status '{}' for feature '{}' is not a known lifecycle status",
                old_literal, feature_key
            ))
        })?;

        if current == target {
            if !note.is_empty() {
                insert_history(&mut tx, feature_key, &old_literal, new_status, actor, note)
                    .await?;
                tx.commit().await?;
            }
            tracing::debug!(feature_key, status = %current, "Self-loop transition (no-op)");
            return Ok(());
        }

        if !current.can_transition_to(target) {
            // Transaction dropped here; nothing was written.
            return Err(Error::InvalidTransition {
                from: current.as_str().to_string(),
                to: target.as_str().to_string(),
            });
        }

        let implemented_at: Option<DateTime<Utc>> = if target.is_release() {
            Some(Utc::now())
        } else {
            None
        };

        sqlx::query(
            r#"
            INSERT INTO feature_status (feature_key, status, implemented_at)
            VALUES (?, ?, ?)
            ON CONFLICT(feature_key) DO UPDATE SET
                status = excluded.status,
                implemented_at = excluded.implemented_at
            "#,
        )
        .bind(feature_key)
        .bind(target.as_str())
        .bind(implemented_at)
        .execute(&mut *tx)
        .await?;

        insert_history(&mut tx, feature_key, &old_literal, new_status, actor, note).await?;

        tx.commit().await?;

        tracing::info!(
            feature_key,
            from = %current,
            to = %target,
            actor,
            "Feature transitioned"
        );

        Ok(())
    }

    /// Current status of a feature (`Draft` when no row exists)
    pub async fn current_status(&self, feature_key: &str) -> Result<FeatureStatus> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT status FROM feature_status WHERE feature_key = ?")
                .bind(feature_key)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((s,)) => FeatureStatus::normalize(&s).ok_or_else(|| {
                Error::Parse(format!("stored status '{}' is not a known lifecycle status", s))
            }),
            None => Ok(FeatureStatus::Draft),
        }
    }

    /// Whether the feature may be enabled for domain builds
    pub async fn is_release_eligible(&self, feature_key: &str) -> Result<bool> {
        Ok(self.current_status(feature_key).await?.is_release())
    }
}

async fn insert_history(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    feature_key: &str,
    old_status: &str,
    new_status: &str,
    actor: &str,
    note: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO feature_history (id, feature_key, old_status, new_status, actor, note, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(feature_key)
    .bind(old_status)
    .bind(new_status)
    .bind(actor)
    .bind(note)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;

    Ok(())
}
