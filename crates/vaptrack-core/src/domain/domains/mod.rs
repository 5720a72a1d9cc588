//! Domain/feature composition and the build record log

pub mod entity;
pub mod repository;

pub use entity::{BuildRecord, Domain};
pub use repository::DomainRepository;
