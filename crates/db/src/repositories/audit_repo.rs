//! Repository for the append-only `entity_audit_events` table.

use curricula_core::curriculum::EntityKind;
use curricula_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::audit::{CreateAuditEvent, EntityAuditEvent};

/// Column list for `entity_audit_events` queries.
const COLUMNS: &str = "\
    id, entity_id, kind, code, version, action, actor_id, description, created_at";

/// Provides insert and query operations for audit events.
pub struct AuditEventRepo;

impl AuditEventRepo {
    /// Append an audit event. Runs on the caller's transaction so the event
    /// commits or rolls back with the change it records.
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateAuditEvent,
    ) -> Result<EntityAuditEvent, sqlx::Error> {
        let query = format!(
            "INSERT INTO entity_audit_events
                (entity_id, kind, code, version, action, actor_id, description)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EntityAuditEvent>(&query)
            .bind(input.entity_id)
            .bind(input.kind.as_str())
            .bind(&input.code)
            .bind(input.version)
            .bind(&input.action)
            .bind(input.actor_id)
            .bind(&input.description)
            .fetch_one(&mut *conn)
            .await
    }

    /// Events recorded against one version, oldest first.
    pub async fn list_for_entity(
        pool: &PgPool,
        entity_id: DbId,
    ) -> Result<Vec<EntityAuditEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM entity_audit_events \
             WHERE entity_id = $1 \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, EntityAuditEvent>(&query)
            .bind(entity_id)
            .fetch_all(pool)
            .await
    }

    /// Every event of a family, including family-level events whose row was
    /// hard-deleted, oldest first.
    pub async fn list_for_family(
        pool: &PgPool,
        kind: EntityKind,
        code: &str,
    ) -> Result<Vec<EntityAuditEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM entity_audit_events \
             WHERE kind = $1 AND code = $2 \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, EntityAuditEvent>(&query)
            .bind(kind.as_str())
            .bind(code)
            .fetch_all(pool)
            .await
    }
}
