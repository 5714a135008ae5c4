//! Repository for the append-only `entity_messages` table.

use curricula_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::message::{CreateEntityMessage, EntityMessage};

const COLUMNS: &str = "id, entity_id, author_id, message, created_at";

/// Provides insert and query operations for entity messages.
pub struct EntityMessageRepo;

impl EntityMessageRepo {
    /// Append a message on the caller's transaction.
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateEntityMessage,
    ) -> Result<EntityMessage, sqlx::Error> {
        let query = format!(
            "INSERT INTO entity_messages (entity_id, author_id, message) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EntityMessage>(&query)
            .bind(input.entity_id)
            .bind(input.author_id)
            .bind(&input.message)
            .fetch_one(&mut *conn)
            .await
    }

    pub async fn list_for_entity(
        pool: &PgPool,
        entity_id: DbId,
    ) -> Result<Vec<EntityMessage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM entity_messages \
             WHERE entity_id = $1 \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, EntityMessage>(&query)
            .bind(entity_id)
            .fetch_all(pool)
            .await
    }
}
