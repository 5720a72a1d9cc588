//! Feature status repository
//!
//! Read access to status rows plus assignment updates. Status values are
//! only ever written through the workflow engine; this repository never
//! changes the `status` column.

use super::entity::FeatureState;
use crate::domain::workflow::FeatureStatus;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;

/// Repository for the feature_status table
#[derive(Debug, Clone)]
pub struct FeatureStatusRepository {
    pool: SqlitePool,
}

impl FeatureStatusRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the status row for one feature, if present
    pub async fn get(&self, feature_key: &str) -> Result<Option<FeatureState>> {
        let row: Option<FeatureStateRow> = sqlx::query_as(
            r#"
            SELECT feature_key, status, implemented_at, assigned_to
            FROM feature_status
            WHERE feature_key = ?
            "#,
        )
        .bind(feature_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        match row {
            Some(row) => Ok(Some(row.into_state()?)),
            None => Ok(None),
        }
    }

    /// All status rows keyed by feature key
    pub async fn get_all(&self) -> Result<HashMap<String, FeatureState>> {
        let rows: Vec<FeatureStateRow> = sqlx::query_as(
            "SELECT feature_key, status, implemented_at, assigned_to FROM feature_status",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        rows.into_iter()
            .map(|row| {
                let state = row.into_state()?;
                Ok((state.feature_key.clone(), state))
            })
            .collect()
    }

    /// Assign (or unassign) a feature.
    ///
    /// Creates a Draft status row for a feature that has none yet.
    pub async fn set_assignee(&self, feature_key: &str, assignee: Option<&str>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO feature_status (feature_key, status, assigned_to)
            VALUES (?, ?, ?)
            ON CONFLICT(feature_key) DO UPDATE SET assigned_to = excluded.assigned_to
            "#,
        )
        .bind(feature_key)
        .bind(FeatureStatus::Draft.as_str())
        .bind(assignee)
        .execute(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        Ok(())
    }
}

/// Database row for feature status
#[derive(sqlx::FromRow)]
struct FeatureStateRow {
    feature_key: String,
    status: String,
    implemented_at: Option<DateTime<Utc>>,
    assigned_to: Option<String>,
}

impl FeatureStateRow {
    fn into_state(self) -> Result<FeatureState> {
        let status = FeatureStatus::normalize(&self.status).ok_or_else(|| {
            Error::Parse(format!(
                "stored status '{}' is not a known lifecycle status",
                self.status
            ))
        })?;

        Ok(FeatureState {
            feature_key: self.feature_key,
            status,
            implemented_at: self.implemented_at,
            assigned_to: self.assigned_to,
        })
    }
}
