//! Catalog entry and key derivation

use serde::{Deserialize, Serialize};

/// One externally supplied feature definition.
///
/// Catalog fields are immutable per import; lifecycle state and meta live
/// in their own stores and are merged in at read time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Explicit stable key; derived from `name` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Human-readable feature name (display label)
    pub name: String,

    /// Category label
    #[serde(default)]
    pub category: Option<String>,

    /// What the feature protects against
    #[serde(default)]
    pub description: Option<String>,

    /// Remediation guidance text
    #[serde(default)]
    pub remediation: Option<String>,
}

impl CatalogEntry {
    /// The stable key: explicit if present, otherwise slugified name
    pub fn resolved_key(&self) -> String {
        match &self.key {
            Some(key) if !key.is_empty() => key.clone(),
            _ => slugify(&self.name),
        }
    }
}

/// Derive a stable slug from a human-readable name.
///
/// Lowercases, collapses every run of non-alphanumeric characters into a
/// single `-`, and trims leading/trailing dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true; // suppress a leading dash

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
