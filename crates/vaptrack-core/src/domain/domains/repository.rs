//! Domain repository for database operations
//!
//! Handles domain records, the per-domain enabled feature set, and the
//! append-only build log.

use super::entity::{BuildRecord, Domain};
use crate::domain::workflow::FeatureStatus;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Repository for domains, domain_features and domain_builds
#[derive(Debug, Clone)]
pub struct DomainRepository {
    pool: SqlitePool,
}

impl DomainRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ========== Domains ==========

    /// Add or update a domain, keyed by its unique hostname.
    ///
    /// Returns the stored domain (with its resolved feature list).
    pub async fn upsert(
        &self,
        domain: &str,
        is_wildcard: bool,
        license_id: &str,
        license_type: &str,
    ) -> Result<Domain> {
        if domain.is_empty() {
            return Err(Error::InvalidInput("domain must not be empty".to_string()));
        }

        sqlx::query(
            r#"
            INSERT INTO domains (id, domain, is_wildcard, license_id, license_type)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(domain) DO UPDATE SET
                is_wildcard = excluded.is_wildcard,
                license_id = excluded.license_id,
                license_type = excluded.license_type
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(domain)
        .bind(is_wildcard)
        .bind(license_id)
        .bind(license_type)
        .execute(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        self.get_by_name(domain)
            .await?
            .ok_or_else(|| Error::DomainNotFound(domain.to_string()))
    }

    /// Get a domain by ID, with its resolved feature list
    pub async fn get(&self, domain_id: Uuid) -> Result<Option<Domain>> {
        let row: Option<DomainRow> = sqlx::query_as(
            "SELECT id, domain, is_wildcard, license_id, license_type FROM domains WHERE id = ?",
        )
        .bind(domain_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        match row {
            Some(row) => {
                let mut domain = row.into_domain()?;
                domain.features = self.get_features(domain.id).await?;
                Ok(Some(domain))
            }
            None => Ok(None),
        }
    }

    /// Get a domain by hostname, with its resolved feature list
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Domain>> {
        let row: Option<DomainRow> = sqlx::query_as(
            "SELECT id, domain, is_wildcard, license_id, license_type FROM domains WHERE domain = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        match row {
            Some(row) => {
                let mut domain = row.into_domain()?;
                domain.features = self.get_features(domain.id).await?;
                Ok(Some(domain))
            }
            None => Ok(None),
        }
    }

    /// List all domains with their resolved feature lists
    pub async fn list(&self) -> Result<Vec<Domain>> {
        let rows: Vec<DomainRow> = sqlx::query_as(
            "SELECT id, domain, is_wildcard, license_id, license_type FROM domains ORDER BY domain",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        // One grouped query for all enablements instead of one per domain
        let feature_rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT domain_id, feature_key FROM domain_features WHERE enabled = 1 ORDER BY feature_key",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        let mut domains = Vec::with_capacity(rows.len());
        for row in rows {
            let mut domain = row.into_domain()?;
            domain.features = feature_rows
                .iter()
                .filter(|(domain_id, _)| *domain_id == domain.id.to_string())
                .map(|(_, key)| key.clone())
                .collect();
            domains.push(domain);
        }

        Ok(domains)
    }

    // ========== Enabled feature sets ==========

    /// Replace a domain's entire enabled feature set.
    ///
    /// Delete-then-insert inside one transaction: callers always submit the
    /// full desired set, never a diff. Every submitted key must currently
    /// be in Release status; a single non-released key rejects the whole
    /// set and leaves the previous enablement untouched.
    pub async fn set_features(&self, domain_id: Uuid, feature_keys: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<(String,)> = sqlx::query_as("SELECT id FROM domains WHERE id = ?")
            .bind(domain_id.to_string())
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(Error::DomainNotFound(domain_id.to_string()));
        }

        for key in feature_keys {
            let row: Option<(String,)> =
                sqlx::query_as("SELECT status FROM feature_status WHERE feature_key = ?")
                    .bind(key)
                    .fetch_optional(&mut *tx)
                    .await?;

            let released = row
                .and_then(|(s,)| FeatureStatus::normalize(&s))
                .map(|s| s.is_release())
                .unwrap_or(false);
            if !released {
                // Transaction dropped; previous set stays intact
                return Err(Error::FeatureNotReleased(key.clone()));
            }
        }

        sqlx::query("DELETE FROM domain_features WHERE domain_id = ?")
            .bind(domain_id.to_string())
            .execute(&mut *tx)
            .await?;

        for key in feature_keys {
            sqlx::query(
                "INSERT INTO domain_features (id, domain_id, feature_key, enabled) VALUES (?, ?, ?, 1)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(domain_id.to_string())
            .bind(key)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            domain_id = %domain_id,
            count = feature_keys.len(),
            "Domain feature set replaced"
        );

        Ok(())
    }

    /// Enabled feature keys for a domain, sorted
    pub async fn get_features(&self, domain_id: Uuid) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT feature_key FROM domain_features
            WHERE domain_id = ? AND enabled = 1
            ORDER BY feature_key
            "#,
        )
        .bind(domain_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        Ok(rows.into_iter().map(|(key,)| key).collect())
    }

    // ========== Build log ==========

    /// Append one build record. No validation beyond the key list itself;
    /// this is an audit log of attempts, successful or not.
    pub async fn record_build(
        &self,
        domain: &str,
        version: &str,
        feature_keys: &[String],
    ) -> Result<BuildRecord> {
        let record = BuildRecord {
            id: Uuid::new_v4(),
            domain: domain.to_string(),
            version: version.to_string(),
            features: feature_keys.to_vec(),
            created_at: Utc::now(),
        };

        let features_json = serde_json::to_string(&record.features)
            .map_err(|e| Error::InvalidInput(format!("feature keys not serializable: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO domain_builds (id, domain, version, features, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.to_string())
        .bind(&record.domain)
        .bind(&record.version)
        .bind(&features_json)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        Ok(record)
    }

    /// Build history, newest first, optionally filtered by domain
    pub async fn build_history(&self, domain: Option<&str>) -> Result<Vec<BuildRecord>> {
        let rows: Vec<BuildRecordRow> = match domain {
            Some(domain) => {
                sqlx::query_as(
                    r#"
                    SELECT id, domain, version, features, created_at
                    FROM domain_builds
                    WHERE domain = ?
                    ORDER BY created_at DESC, rowid DESC
                    "#,
                )
                .bind(domain)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as(
                    r#"
                    SELECT id, domain, version, features, created_at
                    FROM domain_builds
                    ORDER BY created_at DESC, rowid DESC
                    "#,
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(Error::DatabaseError)?;

        rows.into_iter().map(|row| row.into_record()).collect()
    }
}

// ========== Database Row Types ==========

/// Database row for a domain
#[derive(sqlx::FromRow)]
struct DomainRow {
    id: String,
    domain: String,
    is_wildcard: bool,
    license_id: String,
    license_type: String,
}

impl DomainRow {
    fn into_domain(self) -> Result<Domain> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| Error::Parse(format!("Invalid domain ID: {}", e)))?;

        Ok(Domain {
            id,
            domain: self.domain,
            is_wildcard: self.is_wildcard,
            license_id: self.license_id,
            license_type: self.license_type,
            features: Vec::new(),
        })
    }
}

/// Database row for a build record
#[derive(sqlx::FromRow)]
struct BuildRecordRow {
    id: String,
    domain: String,
    version: String,
    features: String,
    created_at: DateTime<Utc>,
}

impl BuildRecordRow {
    fn into_record(self) -> Result<BuildRecord> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| Error::Parse(format!("Invalid build record ID: {}", e)))?;
        let features: Vec<String> = serde_json::from_str(&self.features)
            .map_err(|e| Error::Parse(format!("Invalid build feature list JSON: {}", e)))?;

        Ok(BuildRecord {
            id,
            domain: self.domain,
            version: self.version,
            features,
            created_at: self.created_at,
        })
    }
}
