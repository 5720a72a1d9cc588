//! Domain and build record entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A target deployment, identified by hostname, with its enabled feature set.
///
/// Features are referenced by key (weak reference into the catalog), not
/// owned by the domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    /// Unique domain identifier
    pub id: Uuid,

    /// Hostname this domain targets
    pub domain: String,

    /// Whether the hostname covers subdomains
    pub is_wildcard: bool,

    /// License reference
    pub license_id: String,

    /// License tier
    pub license_type: String,

    /// Enabled feature keys
    pub features: Vec<String>,
}

impl Domain {
    /// Create a new domain with no enabled features
    pub fn new(
        domain: impl Into<String>,
        is_wildcard: bool,
        license_id: impl Into<String>,
        license_type: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            domain: domain.into(),
            is_wildcard,
            license_id: license_id.into(),
            license_type: license_type.into(),
            features: Vec::new(),
        }
    }
}

/// Immutable record of one build attempt for a domain.
///
/// This is a log, not a queue: rows are appended and never consumed,
/// mutated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildRecord {
    /// Unique record identifier
    pub id: Uuid,

    /// Hostname the package was assembled for
    pub domain: String,

    /// Package version string
    pub version: String,

    /// Feature keys bundled into the package
    pub features: Vec<String>,

    /// When the build was recorded
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_domain_has_no_features() {
        let domain = Domain::new("example.com", false, "LIC-1", "standard");
        assert_eq!(domain.domain, "example.com");
        assert!(!domain.is_wildcard);
        assert!(domain.features.is_empty());
    }
}
