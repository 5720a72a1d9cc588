//! Feature state and meta entities

use crate::domain::workflow::FeatureStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted lifecycle state of one feature.
///
/// Invariant: `implemented_at` is non-null iff `status` is `Release`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureState {
    /// Stable feature key
    pub feature_key: String,

    /// Current lifecycle status
    pub status: FeatureStatus,

    /// Set when the feature entered Release, cleared otherwise
    pub implemented_at: Option<DateTime<Utc>>,

    /// Optional user reference the feature is assigned to
    pub assigned_to: Option<String>,
}

impl FeatureState {
    /// Default state for a feature with no status row
    pub fn draft(feature_key: impl Into<String>) -> Self {
        Self {
            feature_key: feature_key.into(),
            status: FeatureStatus::Draft,
            implemented_at: None,
            assigned_to: None,
        }
    }
}

/// Auxiliary attributes of a feature, independent of lifecycle status.
///
/// `generated_schema` and `implementation_data` are opaque JSON blobs:
/// stored exactly as given and returned exactly as stored, never
/// interpreted by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMeta {
    /// Stable feature key
    pub feature_key: String,

    /// Category label
    pub category: String,

    /// Test method documentation text
    pub test_method: String,

    /// Verification steps documentation text
    pub verification_steps: String,

    /// Whether the test method is included in generated documentation
    pub include_test_method: bool,

    /// Whether verification steps are included in generated documentation
    pub include_verification: bool,

    /// Whether the feature is enforced rather than advisory
    pub is_enforced: bool,

    /// Optional wireframe/mockup URL
    pub wireframe_url: Option<String>,

    /// Opaque UI-control schema
    pub generated_schema: Option<serde_json::Value>,

    /// Opaque implementation data keyed by the schema's control keys
    pub implementation_data: Option<serde_json::Value>,
}

impl FeatureMeta {
    /// Default meta for a feature with no meta row
    pub fn empty(feature_key: impl Into<String>) -> Self {
        Self {
            feature_key: feature_key.into(),
            category: String::new(),
            test_method: String::new(),
            verification_steps: String::new(),
            include_test_method: false,
            include_verification: false,
            is_enforced: false,
            wireframe_url: None,
            generated_schema: None,
            implementation_data: None,
        }
    }

    /// Apply a partial update, leaving absent fields untouched
    pub fn apply(&mut self, patch: &MetaPatch) {
        if let Some(category) = &patch.category {
            self.category = category.clone();
        }
        if let Some(test_method) = &patch.test_method {
            self.test_method = test_method.clone();
        }
        if let Some(verification_steps) = &patch.verification_steps {
            self.verification_steps = verification_steps.clone();
        }
        if let Some(include_test_method) = patch.include_test_method {
            self.include_test_method = include_test_method;
        }
        if let Some(include_verification) = patch.include_verification {
            self.include_verification = include_verification;
        }
        if let Some(is_enforced) = patch.is_enforced {
            self.is_enforced = is_enforced;
        }
        if let Some(wireframe_url) = &patch.wireframe_url {
            self.wireframe_url = Some(wireframe_url.clone());
        }
        if let Some(generated_schema) = &patch.generated_schema {
            self.generated_schema = Some(generated_schema.clone());
        }
        if let Some(implementation_data) = &patch.implementation_data {
            self.implementation_data = Some(implementation_data.clone());
        }
    }
}

/// Partial meta update: only `Some` fields are written
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetaPatch {
    pub category: Option<String>,
    pub test_method: Option<String>,
    pub verification_steps: Option<String>,
    pub include_test_method: Option<bool>,
    pub include_verification: Option<bool>,
    pub is_enforced: Option<bool>,
    pub wireframe_url: Option<String>,
    pub generated_schema: Option<serde_json::Value>,
    pub implementation_data: Option<serde_json::Value>,
}
