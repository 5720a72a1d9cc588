//! vaptrack Core Library
//!
//! This crate provides the core functionality for vaptrack, including:
//! - Workflow engine (Draft → Develop → Test → Release state machine)
//! - Append-only transition history (audit log)
//! - Feature catalog merge (catalog + status + meta → enriched views)
//! - Domain/feature composition and the build record log
//! - Storage (SQLite via sqlx, versioned migrations)

pub mod config;
pub mod domain;
pub mod error;
pub mod storage;
pub mod tracker;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::domain::workflow::FeatureStatus;
    pub use crate::error::{Error, Result};
    pub use crate::tracker::FeatureTracker;
}
