//! Storage layer: SQLite database and schema migrations

pub mod database;
pub mod migrations;

pub use database::{Database, DatabaseConfig, default_database_path};
pub use migrations::MigrationStatus;
