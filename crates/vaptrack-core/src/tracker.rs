//! High-level facade over the workflow engine, repositories and catalog
//!
//! The tracker owns one database handle and a catalog data directory and
//! exposes every operation callers need, so the CLI never touches the
//! repositories directly.

use crate::domain::catalog::{self, CatalogEntry, FeatureView, Scope};
use crate::domain::domains::{BuildRecord, Domain, DomainRepository};
use crate::domain::features::{
    FeatureMeta, FeatureMetaRepository, FeatureStatusRepository, MetaPatch,
};
use crate::domain::history::{HistoryEvent, HistoryRepository};
use crate::domain::workflow::{FeatureStatus, WorkflowEngine};
use crate::error::{Error, Result};
use crate::storage::Database;
use std::path::PathBuf;
use uuid::Uuid;

/// Facade over the full feature lifecycle tracker
#[derive(Debug, Clone)]
pub struct FeatureTracker {
    engine: WorkflowEngine,
    status_repo: FeatureStatusRepository,
    meta_repo: FeatureMetaRepository,
    history_repo: HistoryRepository,
    domain_repo: DomainRepository,
    data_dir: PathBuf,
}

impl FeatureTracker {
    /// Create a tracker on an open database and a catalog data directory
    pub fn new(database: &Database, data_dir: impl Into<PathBuf>) -> Self {
        let pool = database.pool().clone();
        Self {
            engine: WorkflowEngine::new(pool.clone()),
            status_repo: FeatureStatusRepository::new(pool.clone()),
            meta_repo: FeatureMetaRepository::new(pool.clone()),
            history_repo: HistoryRepository::new(pool.clone()),
            domain_repo: DomainRepository::new(pool),
            data_dir: data_dir.into(),
        }
    }

    // ========== Features ==========

    /// List a catalog's features enriched with status, meta and history,
    /// projected for the given scope
    pub async fn list_features(&self, catalog_file: &str, scope: Scope) -> Result<Vec<FeatureView>> {
        let entries = catalog::loader::load_catalog(&self.data_dir, catalog_file)?;
        let status_map = self.status_repo.get_all().await?;
        let meta_map = self.meta_repo.get_all().await?;
        let history_counts = self.history_repo.counts_by_feature().await?;

        Ok(catalog::merge(
            &entries,
            &status_map,
            &meta_map,
            &history_counts,
            scope,
        ))
    }

    /// Transition a feature to a new status
    pub async fn transition_feature(
        &self,
        feature_key: &str,
        new_status: &str,
        note: &str,
        actor: &str,
    ) -> Result<()> {
        self.engine
            .transition(feature_key, new_status, note, actor)
            .await
    }

    /// Current lifecycle status of a feature (Draft when untracked)
    pub async fn feature_status(&self, feature_key: &str) -> Result<FeatureStatus> {
        self.engine.current_status(feature_key).await
    }

    /// Transition history for a feature, newest first
    pub async fn get_history(&self, feature_key: &str) -> Result<Vec<HistoryEvent>> {
        self.history_repo.get_history(feature_key).await
    }

    /// Update a feature's meta record.
    ///
    /// The key must exist in the named catalog; meta rows are never created
    /// for keys the catalog does not define.
    pub async fn update_feature_meta(
        &self,
        catalog_file: &str,
        feature_key: &str,
        patch: &MetaPatch,
    ) -> Result<FeatureMeta> {
        let entries = catalog::loader::load_catalog(&self.data_dir, catalog_file)?;
        let known = entries
            .iter()
            .any(|entry| entry.resolved_key() == feature_key);
        if !known {
            return Err(Error::FeatureNotFound(feature_key.to_string()));
        }

        self.meta_repo.update(feature_key, patch).await
    }

    /// Assign or unassign a feature
    pub async fn assign_feature(&self, feature_key: &str, assignee: Option<&str>) -> Result<()> {
        self.status_repo.set_assignee(feature_key, assignee).await
    }

    // ========== Catalogs ==========

    /// Raw entries of one catalog file
    pub fn load_catalog(&self, catalog_file: &str) -> Result<Vec<CatalogEntry>> {
        catalog::loader::load_catalog(&self.data_dir, catalog_file)
    }

    /// Names of the catalog files available in the data directory
    pub fn list_catalog_files(&self) -> Result<Vec<String>> {
        catalog::loader::list_catalog_files(&self.data_dir)
    }

    // ========== Domains ==========

    /// All registered domains with their enabled feature sets
    pub async fn list_domains(&self) -> Result<Vec<Domain>> {
        self.domain_repo.list().await
    }

    /// Add or update a domain, keyed by hostname
    pub async fn upsert_domain(
        &self,
        domain: &str,
        is_wildcard: bool,
        license_id: &str,
        license_type: &str,
    ) -> Result<Domain> {
        self.domain_repo
            .upsert(domain, is_wildcard, license_id, license_type)
            .await
    }

    /// Look up one domain by hostname
    pub async fn get_domain(&self, name: &str) -> Result<Option<Domain>> {
        self.domain_repo.get_by_name(name).await
    }

    /// Replace a domain's enabled feature set.
    ///
    /// Accepts the hostname; every submitted key must be in Release status.
    pub async fn set_domain_features(&self, name: &str, feature_keys: &[String]) -> Result<Domain> {
        let domain = self
            .domain_repo
            .get_by_name(name)
            .await?
            .ok_or_else(|| Error::DomainNotFound(name.to_string()))?;

        self.domain_repo.set_features(domain.id, feature_keys).await?;

        self.domain_repo
            .get(domain.id)
            .await?
            .ok_or_else(|| Error::DomainNotFound(name.to_string()))
    }

    // ========== Builds ==========

    /// Append one build record for a domain
    pub async fn record_build(
        &self,
        domain: &str,
        version: &str,
        feature_keys: &[String],
    ) -> Result<BuildRecord> {
        self.domain_repo
            .record_build(domain, version, feature_keys)
            .await
    }

    /// Record a build using the domain's currently enabled feature set
    pub async fn record_build_from_domain(
        &self,
        domain_id: Uuid,
        version: &str,
    ) -> Result<BuildRecord> {
        let domain = self
            .domain_repo
            .get(domain_id)
            .await?
            .ok_or_else(|| Error::DomainNotFound(domain_id.to_string()))?;

        self.domain_repo
            .record_build(&domain.domain, version, &domain.features)
            .await
    }

    /// Build history, newest first, optionally filtered by domain
    pub async fn get_build_history(&self, domain: Option<&str>) -> Result<Vec<BuildRecord>> {
        self.domain_repo.build_history(domain).await
    }
}
