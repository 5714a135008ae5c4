//! Audit event model. Rows are immutable once written (no `updated_at`).

use curricula_core::audit::{TimelineEntry, TimelineEntryKind};
use curricula_core::curriculum::EntityKind;
use curricula_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `entity_audit_events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EntityAuditEvent {
    pub id: DbId,
    /// `None` for family-level events recorded after a hard delete.
    pub entity_id: Option<DbId>,
    #[sqlx(try_from = "String")]
    pub kind: EntityKind,
    pub code: String,
    pub version: i32,
    pub action: String,
    pub actor_id: DbId,
    pub description: String,
    pub created_at: Timestamp,
}

/// DTO for appending an audit event.
#[derive(Debug, Clone)]
pub struct CreateAuditEvent {
    pub entity_id: Option<DbId>,
    pub kind: EntityKind,
    pub code: String,
    pub version: i32,
    pub action: String,
    pub actor_id: DbId,
    pub description: String,
}

impl From<EntityAuditEvent> for TimelineEntry {
    fn from(event: EntityAuditEvent) -> Self {
        TimelineEntry {
            id: event.id,
            entry_type: TimelineEntryKind::Event,
            action: Some(event.action),
            actor_id: event.actor_id,
            text: event.description,
            timestamp: event.created_at,
        }
    }
}
