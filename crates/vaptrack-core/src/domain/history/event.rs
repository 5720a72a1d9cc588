//! History event entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One recorded lifecycle transition.
///
/// `old_status` and `new_status` carry the literal strings seen at
/// transition time (before normalization), so the audit trail shows
/// exactly what was requested — including legacy vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEvent {
    /// Unique event identifier
    pub id: Uuid,

    /// Feature the transition applied to
    pub feature_key: String,

    /// Status before the transition, as stored
    pub old_status: String,

    /// Status requested by the caller, verbatim
    pub new_status: String,

    /// Who requested the transition
    pub actor: String,

    /// Free-form audit note
    pub note: String,

    /// When the transition happened
    pub created_at: DateTime<Utc>,
}

impl HistoryEvent {
    /// Create a new event stamped with the current time
    pub fn new(
        feature_key: impl Into<String>,
        old_status: impl Into<String>,
        new_status: impl Into<String>,
        actor: impl Into<String>,
        note: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            feature_key: feature_key.into(),
            old_status: old_status.into(),
            new_status: new_status.into(),
            actor: actor.into(),
            note: note.into(),
            created_at: Utc::now(),
        }
    }
}
