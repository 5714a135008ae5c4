//! Version manager: creating families, branching, draft edits and reads.

use std::collections::HashSet;

use curricula_core::audit::{actions, TimelineEntry};
use curricula_core::curriculum::{
    merge_patch, parse_payload, validate_code, CurriculumPayload, EntityKind,
};
use curricula_core::error::CoreError;
use curricula_core::lifecycle::{validate_transition, EntityStatus, Trigger};
use curricula_core::permissions::{
    ensure_can_author, ensure_can_view, resolve_authoring_department, visibility_scope, Actor,
};
use curricula_core::types::DbId;
use curricula_core::versioning::{ensure_can_branch, next_version, version_for_create};
use curricula_db::models::audit::EntityAuditEvent;
use curricula_db::models::curriculum_entity::{
    CreateCurriculumEntity, CreateEntityRequest, CurriculumEntity, EntityListQuery, EntityPage,
    ListEntitiesParams,
};
use curricula_db::repositories::{AuditEventRepo, EntityRepo};
use curricula_db::DbPool;
use serde_json::{Map, Value};

use super::family::{take_row, LockedFamily};
use super::recorder;
use crate::error::{AppError, AppResult};

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Create the first draft of a family.
///
/// Fails with `Conflict` if the code is already used by a family of the
/// same kind with a live version; later versions come from
/// [`create_version`]. A code whose versions are all archived starts a new
/// line at the next version number.
pub async fn create_entity<P: CurriculumPayload>(
    pool: &DbPool,
    actor: &Actor,
    request: CreateEntityRequest,
) -> AppResult<CurriculumEntity> {
    let kind = P::KIND;
    let code = request.code.trim().to_string();
    validate_code(&code)?;
    let department_id = resolve_authoring_department(actor, request.department_id)?;

    // Drafts may be incomplete but must have the kind's shape.
    let payload: P = parse_payload(Value::Object(request.payload))?;
    let payload = serde_json::to_value(&payload)
        .map_err(|e| AppError::InternalError(format!("Failed to serialize payload: {e}")))?;

    let mut tx = pool.begin().await?;
    let family = LockedFamily::lock(&mut tx, kind, &code).await?;
    let version = version_for_create(&family.rows)?;
    if let Some(previous) = family.rows.first() {
        // A restarted code stays with the department that owned it.
        if previous.department_id != department_id {
            return Err(CoreError::Conflict(format!(
                "{kind} {code} belongs to department {}",
                previous.department_id
            ))
            .into());
        }
        EntityRepo::clear_latest(&mut tx, kind, &code, None).await?;
    }

    let entity = EntityRepo::insert_line(
        &mut tx,
        &CreateCurriculumEntity {
            kind,
            code,
            department_id,
            creator_id: actor.user_id,
            payload,
        },
        version,
    )
    .await?;
    recorder::record_event(&mut tx, &entity, actions::CREATED, actor.user_id).await?;

    let rows = family.verify(&mut tx).await?;
    tx.commit().await?;

    tracing::info!(
        entity_id = entity.id,
        kind = %kind,
        code = %entity.code,
        version,
        department_id,
        user_id = actor.user_id,
        "Curriculum entity created"
    );

    take_row(rows, kind, entity.id)
}

/// Branch a new draft from an `approved` or `active` version.
///
/// The draft copies the source's payload and department, takes the next
/// version number and becomes the family's latest version.
pub async fn create_version(
    pool: &DbPool,
    actor: &Actor,
    kind: EntityKind,
    source_id: DbId,
) -> AppResult<CurriculumEntity> {
    let mut tx = pool.begin().await?;
    let (family, source) = LockedFamily::lock_for(&mut tx, kind, source_id).await?;

    ensure_can_view(actor, source.department_id, source.status)?;
    ensure_can_author(actor, source.department_id, source.creator_id)?;
    ensure_can_branch(&source, &family.rows)?;

    let version = next_version(&family.rows);
    EntityRepo::clear_latest(&mut tx, kind, &family.code, None).await?;
    let draft = EntityRepo::insert_branch(&mut tx, source.id, version, actor.user_id).await?;
    recorder::record_event(&mut tx, &draft, actions::VERSION_CREATED, actor.user_id).await?;

    let rows = family.verify(&mut tx).await?;
    tx.commit().await?;

    tracing::info!(
        entity_id = draft.id,
        source_id = source.id,
        kind = %kind,
        code = %draft.code,
        version,
        user_id = actor.user_id,
        "New version created"
    );

    take_row(rows, kind, draft.id)
}

/// Apply a shallow merge patch to a draft's payload.
pub async fn edit_draft(
    pool: &DbPool,
    actor: &Actor,
    kind: EntityKind,
    id: DbId,
    patch: Map<String, Value>,
) -> AppResult<CurriculumEntity> {
    let mut tx = pool.begin().await?;
    let (family, entity) = LockedFamily::lock_for(&mut tx, kind, id).await?;

    ensure_can_author(actor, entity.department_id, entity.creator_id)?;
    validate_transition(entity.status, Trigger::Edit)?;
    let payload = merge_patch(kind, &entity.payload, &patch)?;

    let updated = EntityRepo::update_payload(&mut tx, &entity, &payload, actor.user_id)
        .await?
        .ok_or_else(|| concurrent_change(&entity))?;
    recorder::record_event(&mut tx, &updated, actions::UPDATED, actor.user_id).await?;

    let rows = family.verify(&mut tx).await?;
    tx.commit().await?;

    tracing::info!(
        entity_id = id,
        kind = %kind,
        fields = ?patch.keys().collect::<Vec<_>>(),
        user_id = actor.user_id,
        "Draft edited"
    );

    take_row(rows, kind, id)
}

/// Error for a guarded write that matched no row although the family lock
/// was held. Only reachable if a writer bypassed the lock.
pub(super) fn concurrent_change(entity: &CurriculumEntity) -> AppError {
    CoreError::Conflict(format!(
        "{} {} v{} was modified concurrently; reload and retry",
        entity.kind, entity.code, entity.version
    ))
    .into()
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Fetch one version visible to `actor`.
pub async fn get_entity(
    pool: &DbPool,
    actor: &Actor,
    kind: EntityKind,
    id: DbId,
) -> AppResult<CurriculumEntity> {
    let entity = EntityRepo::find_by_id(pool, id)
        .await?
        .filter(|e| e.kind == kind)
        .ok_or(CoreError::NotFound {
            entity: kind.label(),
            id,
        })?;
    ensure_can_view(actor, entity.department_id, entity.status)?;
    Ok(entity)
}

/// List versions of `kind` visible to `actor`.
pub async fn list_entities(
    pool: &DbPool,
    actor: &Actor,
    kind: EntityKind,
    params: ListEntitiesParams,
) -> AppResult<EntityPage> {
    let query = EntityListQuery {
        kind,
        scope: visibility_scope(actor),
        status: params.status,
        department_id: params.department_id,
        code: params.code,
        latest_only: params.latest_only,
        limit: params.limit,
        offset: params.offset,
    };
    Ok(EntityRepo::list(pool, &query).await?)
}

/// Every version of the family of `id` that `actor` may see, oldest first.
pub async fn list_versions(
    pool: &DbPool,
    actor: &Actor,
    kind: EntityKind,
    id: DbId,
) -> AppResult<Vec<CurriculumEntity>> {
    let entity = get_entity(pool, actor, kind, id).await?;
    let family = EntityRepo::list_family(pool, kind, &entity.code).await?;
    Ok(family
        .into_iter()
        .filter(|e| ensure_can_view(actor, e.department_id, e.status).is_ok())
        .collect())
}

/// Merged audit events and messages of one version, newest first.
pub async fn entity_timeline(
    pool: &DbPool,
    actor: &Actor,
    kind: EntityKind,
    id: DbId,
) -> AppResult<Vec<TimelineEntry>> {
    let entity = get_entity(pool, actor, kind, id).await?;
    Ok(recorder::timeline(pool, entity.id).await?)
}

/// Audit events of the whole family of `id`, newest first.
///
/// Callers who may see every version of the family (admins and staff of the
/// owning department) get all events, including those of versions that were
/// since hard-deleted. Anyone else only gets the events of versions they can
/// view, which leaves the active one.
pub async fn family_history(
    pool: &DbPool,
    actor: &Actor,
    kind: EntityKind,
    id: DbId,
) -> AppResult<Vec<EntityAuditEvent>> {
    let entity = get_entity(pool, actor, kind, id).await?;
    let mut events = AuditEventRepo::list_for_family(pool, kind, &entity.code).await?;

    if ensure_can_view(actor, entity.department_id, EntityStatus::Draft).is_err() {
        let visible: HashSet<DbId> = EntityRepo::list_family(pool, kind, &entity.code)
            .await?
            .into_iter()
            .filter(|e| ensure_can_view(actor, e.department_id, e.status).is_ok())
            .map(|e| e.id)
            .collect();
        events.retain(|event| {
            event
                .entity_id
                .is_some_and(|entity_id| visible.contains(&entity_id))
        });
    }

    events.reverse();
    Ok(events)
}
