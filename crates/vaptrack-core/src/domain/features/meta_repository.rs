//! Feature meta repository
//!
//! Partial updates use read-merge-replace: the existing row (or defaults)
//! is loaded, the patch applied, and the whole row written back.

use super::entity::{FeatureMeta, MetaPatch};
use crate::error::{Error, Result};
use sqlx::SqlitePool;
use std::collections::HashMap;

/// Repository for the feature_meta table
#[derive(Debug, Clone)]
pub struct FeatureMetaRepository {
    pool: SqlitePool,
}

impl FeatureMetaRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the meta row for one feature, if present
    pub async fn get(&self, feature_key: &str) -> Result<Option<FeatureMeta>> {
        let row: Option<FeatureMetaRow> = sqlx::query_as(
            r#"
            SELECT feature_key, category, test_method, verification_steps,
                   include_test_method, include_verification, is_enforced,
                   wireframe_url, generated_schema, implementation_data
            FROM feature_meta
            WHERE feature_key = ?
            "#,
        )
        .bind(feature_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        match row {
            Some(row) => Ok(Some(row.into_meta()?)),
            None => Ok(None),
        }
    }

    /// All meta rows keyed by feature key
    pub async fn get_all(&self) -> Result<HashMap<String, FeatureMeta>> {
        let rows: Vec<FeatureMetaRow> = sqlx::query_as(
            r#"
            SELECT feature_key, category, test_method, verification_steps,
                   include_test_method, include_verification, is_enforced,
                   wireframe_url, generated_schema, implementation_data
            FROM feature_meta
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        rows.into_iter()
            .map(|row| {
                let meta = row.into_meta()?;
                Ok((meta.feature_key.clone(), meta))
            })
            .collect()
    }

    /// Apply a partial update, creating the row from defaults if absent.
    ///
    /// Returns the merged meta as written.
    pub async fn update(&self, feature_key: &str, patch: &MetaPatch) -> Result<FeatureMeta> {
        let mut meta = self
            .get(feature_key)
            .await?
            .unwrap_or_else(|| FeatureMeta::empty(feature_key));
        meta.apply(patch);

        let generated_schema = meta.generated_schema.as_ref().map(|v| v.to_string());
        let implementation_data = meta.implementation_data.as_ref().map(|v| v.to_string());

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO feature_meta (
                feature_key, category, test_method, verification_steps,
                include_test_method, include_verification, is_enforced,
                wireframe_url, generated_schema, implementation_data
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&meta.feature_key)
        .bind(&meta.category)
        .bind(&meta.test_method)
        .bind(&meta.verification_steps)
        .bind(meta.include_test_method)
        .bind(meta.include_verification)
        .bind(meta.is_enforced)
        .bind(&meta.wireframe_url)
        .bind(&generated_schema)
        .bind(&implementation_data)
        .execute(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        Ok(meta)
    }
}

/// Database row for feature meta
#[derive(sqlx::FromRow)]
struct FeatureMetaRow {
    feature_key: String,
    category: String,
    test_method: String,
    verification_steps: String,
    include_test_method: bool,
    include_verification: bool,
    is_enforced: bool,
    wireframe_url: Option<String>,
    generated_schema: Option<String>,
    implementation_data: Option<String>,
}

impl FeatureMetaRow {
    fn into_meta(self) -> Result<FeatureMeta> {
        let generated_schema = self
            .generated_schema
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(|e| Error::Parse(format!("Invalid generated_schema JSON: {}", e)))?;
        let implementation_data = self
            .implementation_data
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(|e| Error::Parse(format!("Invalid implementation_data JSON: {}", e)))?;

        Ok(FeatureMeta {
            feature_key: self.feature_key,
            category: self.category,
            test_method: self.test_method,
            verification_steps: self.verification_steps,
            include_test_method: self.include_test_method,
            include_verification: self.include_verification,
            is_enforced: self.is_enforced,
            wireframe_url: self.wireframe_url,
            generated_schema,
            implementation_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use serde_json::json;

    async fn create_test_repo() -> FeatureMetaRepository {
        let db = Database::in_memory()
            .await
            .expect("Failed to create test database");
        FeatureMetaRepository::new(db.pool().clone())
    }

    #[tokio::test]
    async fn test_update_creates_row_from_defaults() {
        let repo = create_test_repo().await;

        let patch = MetaPatch {
            include_test_method: Some(true),
            ..Default::default()
        };
        let meta = repo.update("xss-protection", &patch).await.unwrap();

        assert!(meta.include_test_method);
        assert!(!meta.include_verification);
        assert_eq!(meta.category, "");

        let stored = repo.get("xss-protection").await.unwrap().unwrap();
        assert_eq!(stored, meta);
    }

    #[tokio::test]
    async fn test_partial_update_preserves_other_fields() {
        let repo = create_test_repo().await;

        repo.update(
            "xss-protection",
            &MetaPatch {
                category: Some("owasp-a3".to_string()),
                include_test_method: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        repo.update(
            "xss-protection",
            &MetaPatch {
                include_verification: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let meta = repo.get("xss-protection").await.unwrap().unwrap();
        assert_eq!(meta.category, "owasp-a3");
        assert!(meta.include_test_method);
        assert!(meta.include_verification);
    }

    #[tokio::test]
    async fn test_opaque_blobs_round_trip() {
        let repo = create_test_repo().await;

        let schema = json!({
            "controls": [
                {"key": "mode", "type": "select", "options": ["block", "report"]},
                {"key": "paths", "type": "textarea"}
            ]
        });
        let data = json!({"mode": "block", "paths": "/admin\n/login"});

        repo.update(
            "xss-protection",
            &MetaPatch {
                generated_schema: Some(schema.clone()),
                implementation_data: Some(data.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let meta = repo.get("xss-protection").await.unwrap().unwrap();
        assert_eq!(meta.generated_schema, Some(schema));
        assert_eq!(meta.implementation_data, Some(data));
    }

    #[tokio::test]
    async fn test_get_all() {
        let repo = create_test_repo().await;

        repo.update("a", &MetaPatch::default()).await.unwrap();
        repo.update("b", &MetaPatch::default()).await.unwrap();

        let all = repo.get_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.contains_key("a"));
        assert!(all.contains_key("b"));
    }
}
