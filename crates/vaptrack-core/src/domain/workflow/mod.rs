//! Lifecycle workflow: the status state machine and the transition engine

pub mod engine;
pub mod status;

pub use engine::WorkflowEngine;
pub use status::FeatureStatus;
