//! Free-text notes attached to submit and reject actions.

use curricula_core::audit::{TimelineEntry, TimelineEntryKind};
use curricula_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `entity_messages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EntityMessage {
    pub id: DbId,
    pub entity_id: DbId,
    pub author_id: DbId,
    pub message: String,
    pub created_at: Timestamp,
}

/// DTO for appending a message.
#[derive(Debug, Clone)]
pub struct CreateEntityMessage {
    pub entity_id: DbId,
    pub author_id: DbId,
    pub message: String,
}

impl From<EntityMessage> for TimelineEntry {
    fn from(message: EntityMessage) -> Self {
        TimelineEntry {
            id: message.id,
            entry_type: TimelineEntryKind::Message,
            action: None,
            actor_id: message.author_id,
            text: message.message,
            timestamp: message.created_at,
        }
    }
}
