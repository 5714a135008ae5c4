//! Audit/timeline recorder.
//!
//! Writes go through the caller's transaction so an event commits exactly
//! when the change it records does.

use curricula_core::audit::{describe, merge_timeline, TimelineEntry};
use curricula_core::curriculum::EntityKind;
use curricula_core::types::DbId;
use curricula_db::models::audit::{CreateAuditEvent, EntityAuditEvent};
use curricula_db::models::curriculum_entity::CurriculumEntity;
use curricula_db::models::message::CreateEntityMessage;
use curricula_db::repositories::{AuditEventRepo, EntityMessageRepo};
use curricula_db::DbPool;
use sqlx::PgConnection;

/// Append an audit event for `entity`.
pub async fn record_event(
    conn: &mut PgConnection,
    entity: &CurriculumEntity,
    action: &str,
    actor_id: DbId,
) -> Result<EntityAuditEvent, sqlx::Error> {
    AuditEventRepo::create(
        conn,
        &CreateAuditEvent {
            entity_id: Some(entity.id),
            kind: entity.kind,
            code: entity.code.clone(),
            version: entity.version,
            action: action.to_string(),
            actor_id,
            description: describe(action, entity.kind, &entity.code, entity.version),
        },
    )
    .await
}

/// Append a family-level event for a version whose row no longer exists.
pub async fn record_family_event(
    conn: &mut PgConnection,
    kind: EntityKind,
    code: &str,
    version: i32,
    action: &str,
    actor_id: DbId,
) -> Result<EntityAuditEvent, sqlx::Error> {
    AuditEventRepo::create(
        conn,
        &CreateAuditEvent {
            entity_id: None,
            kind,
            code: code.to_string(),
            version,
            action: action.to_string(),
            actor_id,
            description: describe(action, kind, code, version),
        },
    )
    .await
}

pub async fn record_message(
    conn: &mut PgConnection,
    entity_id: DbId,
    author_id: DbId,
    message: &str,
) -> Result<(), sqlx::Error> {
    EntityMessageRepo::create(
        conn,
        &CreateEntityMessage {
            entity_id,
            author_id,
            message: message.to_string(),
        },
    )
    .await?;
    Ok(())
}

/// Merged events and messages of one version, newest first.
pub async fn timeline(pool: &DbPool, entity_id: DbId) -> Result<Vec<TimelineEntry>, sqlx::Error> {
    let events = AuditEventRepo::list_for_entity(pool, entity_id).await?;
    let messages = EntityMessageRepo::list_for_entity(pool, entity_id).await?;
    Ok(merge_timeline(
        events.into_iter().map(TimelineEntry::from).collect(),
        messages.into_iter().map(TimelineEntry::from).collect(),
    ))
}
