//! Per-feature persisted state: lifecycle status rows and auxiliary meta

pub mod entity;
pub mod meta_repository;
pub mod status_repository;

pub use entity::{FeatureMeta, FeatureState, MetaPatch};
pub use meta_repository::FeatureMetaRepository;
pub use status_repository::FeatureStatusRepository;
