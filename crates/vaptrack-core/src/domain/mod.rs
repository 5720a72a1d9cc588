//! Domain layer: workflow engine, audit history, catalog merge and
//! domain/feature composition.

pub mod catalog;
pub mod domains;
pub mod features;
pub mod history;
pub mod workflow;
