//! Feature catalog: externally supplied definitions, JSON loading and the
//! merge that enriches them with persisted status and meta

pub mod entry;
pub mod loader;
pub mod merge;

pub use entry::{CatalogEntry, slugify};
pub use merge::{FeatureView, Scope, merge};
