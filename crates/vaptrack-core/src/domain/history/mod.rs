//! Append-only transition audit log

pub mod event;
pub mod repository;

pub use event::HistoryEvent;
pub use repository::HistoryRepository;
