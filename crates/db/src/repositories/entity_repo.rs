//! Repository for the `curriculum_entities` table.
//!
//! Reads accept any executor. Writes take a `&mut PgConnection` so the
//! engine can compose them inside one family-scoped transaction; none of
//! them check lifecycle guards, which is the engine's job.

use curricula_core::curriculum::EntityKind;
use curricula_core::lifecycle::EntityStatus;
use curricula_core::permissions::VisibilityScope;
use curricula_core::types::DbId;
use sqlx::{PgConnection, PgExecutor};

use crate::models::curriculum_entity::{
    CreateCurriculumEntity, CurriculumEntity, EntityListQuery, EntityPage,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, kind, code, version, parent_entity_id, is_latest_version, \
    status, creator_id, approver_id, updater_id, department_id, rejection_reason, \
    payload, lock_version, created_at, submitted_at, approved_at, published_at, \
    archived_at, updated_at";

/// Derived `has_new_pending_version` column for queries aliasing the table as `e`.
const PENDING_FLAG: &str = "EXISTS (\
        SELECT 1 FROM curriculum_entities s \
        WHERE s.kind = e.kind AND s.code = e.code AND s.id <> e.id \
          AND s.status IN ('draft', 'pending_approval', 'approved')\
    ) AS has_new_pending_version";

/// Default page size for listings.
pub const DEFAULT_LIMIT: i64 = 50;

/// Maximum page size for listings.
pub const MAX_LIMIT: i64 = 200;

/// Clamp a requested page size to `1..=MAX_LIMIT`.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Clamp a requested offset to be non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

/// How a status change treats `rejection_reason`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonUpdate<'a> {
    Keep,
    Set(&'a str),
    Clear,
}

/// Provides queries and write primitives for curriculum entity versions.
pub struct EntityRepo;

impl EntityRepo {
    // ── Reads ────────────────────────────────────────────────────────

    /// Find a version by id, including the derived pending flag.
    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<CurriculumEntity>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS}, {PENDING_FLAG} FROM curriculum_entities e WHERE e.id = $1"
        );
        sqlx::query_as::<_, CurriculumEntity>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// All versions of a family, oldest first.
    pub async fn list_family<'e>(
        executor: impl PgExecutor<'e>,
        kind: EntityKind,
        code: &str,
    ) -> Result<Vec<CurriculumEntity>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS}, {PENDING_FLAG} FROM curriculum_entities e \
             WHERE e.kind = $1 AND e.code = $2 \
             ORDER BY e.version ASC"
        );
        sqlx::query_as::<_, CurriculumEntity>(&query)
            .bind(kind.as_str())
            .bind(code)
            .fetch_all(executor)
            .await
    }

    /// List versions visible in `params.scope`, newest version first per code.
    pub async fn list(pool: &sqlx::PgPool, params: &EntityListQuery) -> Result<EntityPage, sqlx::Error> {
        let (scope_department, active_only) = scope_binds(params.scope);
        let filter = "WHERE e.kind = $1 \
               AND ($2::TEXT IS NULL OR e.status = $2) \
               AND ($3::BIGINT IS NULL OR e.department_id = $3) \
               AND ($4::TEXT IS NULL OR e.code = $4) \
               AND ($5::BIGINT IS NULL OR e.department_id = $5 OR e.status = 'active') \
               AND (NOT $6 OR e.status = 'active') \
               AND (NOT $7 OR e.is_latest_version)";

        let query = format!(
            "SELECT {COLUMNS}, {PENDING_FLAG} FROM curriculum_entities e {filter} \
             ORDER BY e.code ASC, e.version DESC \
             LIMIT $8 OFFSET $9"
        );
        let items = sqlx::query_as::<_, CurriculumEntity>(&query)
            .bind(params.kind.as_str())
            .bind(params.status.map(EntityStatus::as_str))
            .bind(params.department_id)
            .bind(params.code.as_deref())
            .bind(scope_department)
            .bind(active_only)
            .bind(params.latest_only)
            .bind(clamp_limit(params.limit))
            .bind(clamp_offset(params.offset))
            .fetch_all(pool)
            .await?;

        let count_query = format!("SELECT COUNT(*)::BIGINT FROM curriculum_entities e {filter}");
        let total = sqlx::query_scalar::<_, i64>(&count_query)
            .bind(params.kind.as_str())
            .bind(params.status.map(EntityStatus::as_str))
            .bind(params.department_id)
            .bind(params.code.as_deref())
            .bind(scope_department)
            .bind(active_only)
            .bind(params.latest_only)
            .fetch_one(pool)
            .await?;

        Ok(EntityPage { items, total })
    }

    // ── Family lock ──────────────────────────────────────────────────

    /// Serialise writers of one family for the rest of the transaction and
    /// return the family's rows, row-locked, oldest first.
    ///
    /// The advisory lock also covers families that do not exist yet, so two
    /// concurrent creates of the same code queue behind each other. Must be
    /// called inside a transaction.
    pub async fn lock_family(
        conn: &mut PgConnection,
        kind: EntityKind,
        code: &str,
    ) -> Result<Vec<CurriculumEntity>, sqlx::Error> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(format!("curriculum:{}:{code}", kind.as_str()))
            .execute(&mut *conn)
            .await?;

        let query = format!(
            "SELECT {COLUMNS} FROM curriculum_entities \
             WHERE kind = $1 AND code = $2 \
             ORDER BY version ASC \
             FOR UPDATE"
        );
        sqlx::query_as::<_, CurriculumEntity>(&query)
            .bind(kind.as_str())
            .bind(code)
            .fetch_all(&mut *conn)
            .await
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Insert version 1 of a new family as the latest draft.
    pub async fn insert_first_version(
        conn: &mut PgConnection,
        input: &CreateCurriculumEntity,
    ) -> Result<CurriculumEntity, sqlx::Error> {
        Self::insert_line(conn, input, 1).await
    }

    /// Insert a parentless draft at `version`, starting a new line in a
    /// family whose earlier versions are all archived.
    ///
    /// The caller must clear the family's latest flag first.
    pub async fn insert_line(
        conn: &mut PgConnection,
        input: &CreateCurriculumEntity,
        version: i32,
    ) -> Result<CurriculumEntity, sqlx::Error> {
        let query = format!(
            "INSERT INTO curriculum_entities
                (kind, code, version, parent_entity_id, is_latest_version, status,
                 creator_id, department_id, payload)
             VALUES ($1, $2, $3, NULL, true, 'draft', $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CurriculumEntity>(&query)
            .bind(input.kind.as_str())
            .bind(&input.code)
            .bind(version)
            .bind(input.creator_id)
            .bind(input.department_id)
            .bind(&input.payload)
            .fetch_one(&mut *conn)
            .await
    }

    /// Insert a draft branched from `source_id`, copying its payload verbatim.
    ///
    /// The caller must clear the family's latest flag first; the new row is
    /// inserted as the latest version.
    pub async fn insert_branch(
        conn: &mut PgConnection,
        source_id: DbId,
        version: i32,
        creator_id: DbId,
    ) -> Result<CurriculumEntity, sqlx::Error> {
        let query = format!(
            "INSERT INTO curriculum_entities
                (kind, code, version, parent_entity_id, is_latest_version, status,
                 creator_id, department_id, payload)
             SELECT kind, code, $2, id, true, 'draft', $3, department_id, payload
             FROM curriculum_entities WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CurriculumEntity>(&query)
            .bind(source_id)
            .bind(version)
            .bind(creator_id)
            .fetch_one(&mut *conn)
            .await
    }

    /// Replace the payload of a draft.
    ///
    /// Returns `None` if the row is no longer a draft or its `lock_version`
    /// moved on.
    pub async fn update_payload(
        conn: &mut PgConnection,
        entity: &CurriculumEntity,
        payload: &serde_json::Value,
        updater_id: DbId,
    ) -> Result<Option<CurriculumEntity>, sqlx::Error> {
        let query = format!(
            "UPDATE curriculum_entities SET
                payload = $3,
                updater_id = $4,
                lock_version = lock_version + 1,
                updated_at = clock_timestamp()
             WHERE id = $1 AND lock_version = $2 AND status = 'draft'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CurriculumEntity>(&query)
            .bind(entity.id)
            .bind(entity.lock_version)
            .bind(payload)
            .bind(updater_id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Move `entity` from its current status to `to`.
    ///
    /// Transition timestamps are set only the first time the row enters the
    /// matching status, from `clock_timestamp()` rather than the transaction
    /// start, so a writer that waited on the family lock stamps the moment it
    /// wrote. Entering `approved` records `actor_id` as approver.
    /// Returns `None` if the row's status or `lock_version` no longer match
    /// `entity`.
    pub async fn apply_status(
        conn: &mut PgConnection,
        entity: &CurriculumEntity,
        to: EntityStatus,
        actor_id: DbId,
        reason: ReasonUpdate<'_>,
    ) -> Result<Option<CurriculumEntity>, sqlx::Error> {
        let (touch_reason, new_reason) = match reason {
            ReasonUpdate::Keep => (false, None),
            ReasonUpdate::Set(reason) => (true, Some(reason)),
            ReasonUpdate::Clear => (true, None),
        };
        let query = format!(
            "UPDATE curriculum_entities SET
                status = $4,
                updater_id = $5,
                submitted_at = CASE WHEN $4 = 'pending_approval'
                    THEN COALESCE(submitted_at, clock_timestamp()) ELSE submitted_at END,
                approved_at = CASE WHEN $4 = 'approved'
                    THEN COALESCE(approved_at, clock_timestamp()) ELSE approved_at END,
                approver_id = CASE WHEN $4 = 'approved' THEN $5 ELSE approver_id END,
                published_at = CASE WHEN $4 = 'active'
                    THEN COALESCE(published_at, clock_timestamp()) ELSE published_at END,
                archived_at = CASE WHEN $4 = 'archived'
                    THEN COALESCE(archived_at, clock_timestamp()) ELSE archived_at END,
                rejection_reason = CASE WHEN $6 THEN $7 ELSE rejection_reason END,
                lock_version = lock_version + 1,
                updated_at = clock_timestamp()
             WHERE id = $1 AND lock_version = $2 AND status = $3
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CurriculumEntity>(&query)
            .bind(entity.id)
            .bind(entity.lock_version)
            .bind(entity.status.as_str())
            .bind(to.as_str())
            .bind(actor_id)
            .bind(touch_reason)
            .bind(new_reason)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Move the family's latest flag to `id`.
    ///
    /// The flag is bookkeeping, so this does not bump `lock_version`.
    pub async fn set_latest(
        conn: &mut PgConnection,
        kind: EntityKind,
        code: &str,
        id: DbId,
    ) -> Result<(), sqlx::Error> {
        Self::clear_latest(conn, kind, code, Some(id)).await?;
        sqlx::query(
            "UPDATE curriculum_entities SET is_latest_version = true \
             WHERE id = $1 AND NOT is_latest_version",
        )
        .bind(id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Clear the family's latest flag, except on `keep_id`.
    pub async fn clear_latest(
        conn: &mut PgConnection,
        kind: EntityKind,
        code: &str,
        keep_id: Option<DbId>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE curriculum_entities SET is_latest_version = false \
             WHERE kind = $1 AND code = $2 AND is_latest_version \
               AND ($3::BIGINT IS NULL OR id <> $3)",
        )
        .bind(kind.as_str())
        .bind(code)
        .bind(keep_id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Number of versions branched from `id`.
    pub async fn count_children(conn: &mut PgConnection, id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM curriculum_entities WHERE parent_entity_id = $1",
        )
        .bind(id)
        .fetch_one(&mut *conn)
        .await
    }

    /// Permanently delete a version. Its audit events and messages cascade.
    /// Returns `true` if a row was removed.
    pub async fn hard_delete(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM curriculum_entities WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Bind values encoding a visibility scope for listing queries:
/// `(department that may see non-active rows, active rows only)`.
fn scope_binds(scope: VisibilityScope) -> (Option<DbId>, bool) {
    match scope {
        VisibilityScope::All => (None, false),
        VisibilityScope::Department(department_id) => (Some(department_id), false),
        VisibilityScope::ActiveOnly => (None, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_are_clamped() {
        assert_eq!(clamp_limit(None), DEFAULT_LIMIT);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(10_000)), MAX_LIMIT);
        assert_eq!(clamp_offset(Some(-5)), 0);
        assert_eq!(clamp_offset(None), 0);
    }

    #[test]
    fn scope_binds_encode_visibility() {
        assert_eq!(scope_binds(VisibilityScope::All), (None, false));
        assert_eq!(scope_binds(VisibilityScope::Department(4)), (Some(4), false));
        assert_eq!(scope_binds(VisibilityScope::ActiveOnly), (None, true));
    }
}
