//! Catalog merge: combine catalog entries with persisted status and meta
//!
//! Pure function over its inputs; the same catalog, status map, meta map
//! and history counts always produce the same output.

use super::entry::CatalogEntry;
use crate::domain::features::{FeatureMeta, FeatureState};
use crate::domain::workflow::FeatureStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Read-time projection of the feature list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Privileged callers see every feature
    #[default]
    Admin,
    /// Unprivileged callers only see released features
    Client,
}

/// Enriched feature view produced by the merge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureView {
    /// Stable feature key
    pub key: String,
    /// Display label (the catalog name)
    pub label: String,
    /// Category label from the catalog
    pub category: Option<String>,
    /// Description from the catalog
    pub description: Option<String>,
    /// Remediation guidance from the catalog
    pub remediation: Option<String>,

    /// Current lifecycle status (Draft when no status row exists)
    pub status: FeatureStatus,
    /// Release timestamp, set iff status is Release
    pub implemented_at: Option<DateTime<Utc>>,
    /// Assigned user, if any
    pub assigned_to: Option<String>,

    /// Meta toggles and blobs (defaults when no meta row exists)
    pub include_test_method: bool,
    pub include_verification: bool,
    pub is_enforced: bool,
    pub wireframe_url: Option<String>,
    pub generated_schema: Option<serde_json::Value>,
    pub implementation_data: Option<serde_json::Value>,

    /// Whether any transition has ever been recorded for this feature
    pub has_history: bool,
}

/// Merge catalog entries with status, meta and history counts.
///
/// Unknown keys default to Draft status with all-false toggles. With
/// `Scope::Client` only features whose merged status is Release are kept.
pub fn merge(
    entries: &[CatalogEntry],
    status_map: &HashMap<String, FeatureState>,
    meta_map: &HashMap<String, FeatureMeta>,
    history_counts: &HashMap<String, i64>,
    scope: Scope,
) -> Vec<FeatureView> {
    entries
        .iter()
        .filter_map(|entry| {
            let key = entry.resolved_key();

            let (status, implemented_at, assigned_to) = match status_map.get(&key) {
                Some(state) => (
                    state.status,
                    state.implemented_at,
                    state.assigned_to.clone(),
                ),
                None => (FeatureStatus::Draft, None, None),
            };

            if scope == Scope::Client && !status.is_release() {
                return None;
            }

            let meta = meta_map.get(&key);
            let has_history = history_counts.get(&key).copied().unwrap_or(0) > 0;

            Some(FeatureView {
                label: entry.name.clone(),
                category: entry.category.clone(),
                description: entry.description.clone(),
                remediation: entry.remediation.clone(),
                status,
                implemented_at,
                assigned_to,
                include_test_method: meta.map(|m| m.include_test_method).unwrap_or(false),
                include_verification: meta.map(|m| m.include_verification).unwrap_or(false),
                is_enforced: meta.map(|m| m.is_enforced).unwrap_or(false),
                wireframe_url: meta.and_then(|m| m.wireframe_url.clone()),
                generated_schema: meta.and_then(|m| m.generated_schema.clone()),
                implementation_data: meta.and_then(|m| m.implementation_data.clone()),
                has_history,
                key,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(key: Option<&str>, name: &str) -> CatalogEntry {
        CatalogEntry {
            key: key.map(String::from),
            name: name.to_string(),
            category: Some("owasp".to_string()),
            description: Some("desc".to_string()),
            remediation: Some("fix it".to_string()),
        }
    }

    fn released(key: &str) -> FeatureState {
        FeatureState {
            feature_key: key.to_string(),
            status: FeatureStatus::Release,
            implemented_at: Some(Utc::now()),
            assigned_to: None,
        }
    }

    #[test]
    fn test_merge_defaults_for_unknown_key() {
        let entries = vec![entry(None, "XSS Protection")];
        let views = merge(
            &entries,
            &HashMap::new(),
            &HashMap::new(),
            &HashMap::new(),
            Scope::Admin,
        );

        assert_eq!(views.len(), 1);
        let view = &views[0];
        assert_eq!(view.key, "xss-protection");
        assert_eq!(view.label, "XSS Protection");
        assert_eq!(view.status, FeatureStatus::Draft);
        assert!(view.implemented_at.is_none());
        assert!(!view.include_test_method);
        assert!(!view.has_history);
    }

    #[test]
    fn test_merge_attaches_status_meta_and_history() {
        let entries = vec![entry(Some("xss"), "XSS Protection")];

        let mut status_map = HashMap::new();
        status_map.insert("xss".to_string(), released("xss"));

        let mut meta_map = HashMap::new();
        let mut meta = FeatureMeta::empty("xss");
        meta.include_test_method = true;
        meta.generated_schema = Some(json!({"controls": []}));
        meta_map.insert("xss".to_string(), meta);

        let mut counts = HashMap::new();
        counts.insert("xss".to_string(), 4);

        let views = merge(&entries, &status_map, &meta_map, &counts, Scope::Admin);
        let view = &views[0];

        assert_eq!(view.status, FeatureStatus::Release);
        assert!(view.implemented_at.is_some());
        assert!(view.include_test_method);
        assert_eq!(view.generated_schema, Some(json!({"controls": []})));
        assert!(view.has_history);
    }

    #[test]
    fn test_client_scope_keeps_only_released() {
        let entries = vec![entry(Some("a"), "A"), entry(Some("b"), "B")];

        let mut status_map = HashMap::new();
        status_map.insert("a".to_string(), released("a"));
        // "b" has no status row -> Draft

        let views = merge(
            &entries,
            &status_map,
            &HashMap::new(),
            &HashMap::new(),
            Scope::Client,
        );
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].key, "a");

        let admin_views = merge(
            &entries,
            &status_map,
            &HashMap::new(),
            &HashMap::new(),
            Scope::Admin,
        );
        assert_eq!(admin_views.len(), 2);
    }

    #[test]
    fn test_merge_is_deterministic() {
        let entries = vec![entry(None, "XSS Protection"), entry(Some("csrf"), "CSRF")];
        let mut status_map = HashMap::new();
        status_map.insert("csrf".to_string(), released("csrf"));
        let mut counts = HashMap::new();
        counts.insert("csrf".to_string(), 2);

        let first = merge(&entries, &status_map, &HashMap::new(), &counts, Scope::Admin);
        let second = merge(&entries, &status_map, &HashMap::new(), &counts, Scope::Admin);
        assert_eq!(first, second);
    }

    #[test]
    fn test_merge_preserves_catalog_order() {
        let entries = vec![entry(Some("z"), "Z"), entry(Some("a"), "A")];
        let views = merge(
            &entries,
            &HashMap::new(),
            &HashMap::new(),
            &HashMap::new(),
            Scope::Admin,
        );
        assert_eq!(views[0].key, "z");
        assert_eq!(views[1].key, "a");
    }
}
