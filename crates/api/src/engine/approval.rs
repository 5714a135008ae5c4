//! Approval service: the reviewed part of the lifecycle.
//!
//! ```text
//! submit    draft            -> pending_approval   author, payload complete
//! approve   pending_approval -> approved           HOD of department / admin
//! reject    pending_approval -> draft              HOD / admin, with reason
//! withdraw  approved         -> draft              HOD / admin
//! publish   approved         -> active             HOD / admin; old active archived
//! delete    draft | pending_approval | approved    creator, HOD / admin
//! ```

use curricula_core::approval::{normalize_submission_message, validate_rejection_reason};
use curricula_core::audit::actions;
use curricula_core::curriculum::{EntityKind, EntityPayload};
use curricula_core::lifecycle::{validate_transition, Trigger};
use curricula_core::permissions::{ensure_can_author, ensure_can_delete, ensure_can_review, Actor};
use curricula_core::types::DbId;
use curricula_core::versioning::active_sibling;
use curricula_db::models::curriculum_entity::CurriculumEntity;
use curricula_db::repositories::{EntityRepo, ReasonUpdate};
use curricula_db::DbPool;
use serde::Serialize;

use super::family::{take_row, LockedFamily};
use super::recorder;
use super::versions::concurrent_change;
use crate::error::AppResult;

/// Result of [`delete`].
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// The version had been approved or branched from, so it was archived.
    Archived { entity: CurriculumEntity },
    /// The version was removed together with its own audit trail.
    Deleted { id: DbId },
}

/// Submit a complete draft for approval, with an optional note.
pub async fn submit(
    pool: &DbPool,
    actor: &Actor,
    kind: EntityKind,
    id: DbId,
    message: Option<&str>,
) -> AppResult<CurriculumEntity> {
    let message = normalize_submission_message(message)?;

    let mut tx = pool.begin().await?;
    let (family, entity) = LockedFamily::lock_for(&mut tx, kind, id).await?;

    ensure_can_author(actor, entity.department_id, entity.creator_id)?;
    let next = validate_transition(entity.status, Trigger::Submit)?;
    EntityPayload::from_json(kind, entity.payload.clone())?.check_complete()?;

    let submitted = EntityRepo::apply_status(&mut tx, &entity, next, actor.user_id, ReasonUpdate::Keep)
        .await?
        .ok_or_else(|| concurrent_change(&entity))?;
    recorder::record_event(&mut tx, &submitted, actions::SUBMITTED, actor.user_id).await?;
    if let Some(message) = &message {
        recorder::record_message(&mut tx, id, actor.user_id, message).await?;
    }

    let rows = family.verify(&mut tx).await?;
    tx.commit().await?;

    tracing::info!(
        entity_id = id,
        kind = %kind,
        code = %entity.code,
        version = entity.version,
        user_id = actor.user_id,
        has_message = message.is_some(),
        "Submitted for approval"
    );

    take_row(rows, kind, id)
}

/// Approve a pending version. Clears any earlier rejection reason.
pub async fn approve(
    pool: &DbPool,
    actor: &Actor,
    kind: EntityKind,
    id: DbId,
) -> AppResult<CurriculumEntity> {
    let mut tx = pool.begin().await?;
    let (family, entity) = LockedFamily::lock_for(&mut tx, kind, id).await?;

    ensure_can_review(actor, entity.department_id)?;
    let next = validate_transition(entity.status, Trigger::Approve)?;

    let approved = EntityRepo::apply_status(&mut tx, &entity, next, actor.user_id, ReasonUpdate::Clear)
        .await?
        .ok_or_else(|| concurrent_change(&entity))?;
    recorder::record_event(&mut tx, &approved, actions::APPROVED, actor.user_id).await?;

    let rows = family.verify(&mut tx).await?;
    tx.commit().await?;

    tracing::info!(
        entity_id = id,
        kind = %kind,
        code = %entity.code,
        version = entity.version,
        user_id = actor.user_id,
        "Approved"
    );

    take_row(rows, kind, id)
}

/// Send a pending version back to draft with a reason for the author.
pub async fn reject(
    pool: &DbPool,
    actor: &Actor,
    kind: EntityKind,
    id: DbId,
    reason: &str,
) -> AppResult<CurriculumEntity> {
    let mut tx = pool.begin().await?;
    let (family, entity) = LockedFamily::lock_for(&mut tx, kind, id).await?;

    ensure_can_review(actor, entity.department_id)?;
    let next = validate_transition(entity.status, Trigger::Reject)?;
    let reason = validate_rejection_reason(reason)?;

    let rejected = EntityRepo::apply_status(
        &mut tx,
        &entity,
        next,
        actor.user_id,
        ReasonUpdate::Set(&reason),
    )
    .await?
    .ok_or_else(|| concurrent_change(&entity))?;
    recorder::record_event(&mut tx, &rejected, actions::REJECTED, actor.user_id).await?;
    recorder::record_message(&mut tx, id, actor.user_id, &reason).await?;

    let rows = family.verify(&mut tx).await?;
    tx.commit().await?;

    tracing::info!(
        entity_id = id,
        kind = %kind,
        code = %entity.code,
        version = entity.version,
        user_id = actor.user_id,
        "Rejected"
    );

    take_row(rows, kind, id)
}

/// Return an approved, unpublished version to draft.
pub async fn withdraw(
    pool: &DbPool,
    actor: &Actor,
    kind: EntityKind,
    id: DbId,
) -> AppResult<CurriculumEntity> {
    let mut tx = pool.begin().await?;
    let (family, entity) = LockedFamily::lock_for(&mut tx, kind, id).await?;

    ensure_can_review(actor, entity.department_id)?;
    let next = validate_transition(entity.status, Trigger::Withdraw)?;

    let withdrawn = EntityRepo::apply_status(&mut tx, &entity, next, actor.user_id, ReasonUpdate::Keep)
        .await?
        .ok_or_else(|| concurrent_change(&entity))?;
    recorder::record_event(&mut tx, &withdrawn, actions::WITHDRAWN, actor.user_id).await?;

    let rows = family.verify(&mut tx).await?;
    tx.commit().await?;

    tracing::info!(
        entity_id = id,
        kind = %kind,
        code = %entity.code,
        user_id = actor.user_id,
        "Approval withdrawn"
    );

    take_row(rows, kind, id)
}

/// Make an approved version the family's active version.
///
/// The previously active version, if any, is archived in the same
/// transaction, so the family is never seen with zero or two active rows.
pub async fn publish(
    pool: &DbPool,
    actor: &Actor,
    kind: EntityKind,
    id: DbId,
) -> AppResult<CurriculumEntity> {
    let mut tx = pool.begin().await?;
    let (family, entity) = LockedFamily::lock_for(&mut tx, kind, id).await?;

    ensure_can_review(actor, entity.department_id)?;
    let next = validate_transition(entity.status, Trigger::Publish)?;

    // The old active row goes first: the active index is not deferrable.
    let superseded = match active_sibling(&family.rows, id) {
        Some(old) => {
            let archived_status = validate_transition(old.status, Trigger::Supersede)?;
            let archived = EntityRepo::apply_status(
                &mut tx,
                old,
                archived_status,
                actor.user_id,
                ReasonUpdate::Keep,
            )
            .await?
            .ok_or_else(|| concurrent_change(old))?;
            recorder::record_event(&mut tx, &archived, actions::ARCHIVED, actor.user_id).await?;
            Some(archived.version)
        }
        None => None,
    };

    let published = EntityRepo::apply_status(&mut tx, &entity, next, actor.user_id, ReasonUpdate::Keep)
        .await?
        .ok_or_else(|| concurrent_change(&entity))?;
    recorder::record_event(&mut tx, &published, actions::PUBLISHED, actor.user_id).await?;
    family.sync_latest(&mut tx).await?;

    let rows = family.verify(&mut tx).await?;
    tx.commit().await?;

    tracing::info!(
        entity_id = id,
        kind = %kind,
        code = %entity.code,
        version = entity.version,
        superseded_version = ?superseded,
        user_id = actor.user_id,
        "Published"
    );

    take_row(rows, kind, id)
}

/// Delete a version that is not active.
///
/// A version that ever reached `approved`, or that another version was
/// branched from, is archived instead so its history survives. Otherwise the
/// row and its own audit trail are removed and a family-level `deleted`
/// event records the removal.
pub async fn delete(
    pool: &DbPool,
    actor: &Actor,
    kind: EntityKind,
    id: DbId,
) -> AppResult<DeleteOutcome> {
    let mut tx = pool.begin().await?;
    let (family, entity) = LockedFamily::lock_for(&mut tx, kind, id).await?;

    ensure_can_delete(actor, entity.department_id, entity.creator_id)?;
    let archived_status = validate_transition(entity.status, Trigger::Delete)?;

    let children = EntityRepo::count_children(&mut tx, id).await?;
    let outcome = if entity.ever_approved() || children > 0 {
        let archived = EntityRepo::apply_status(
            &mut tx,
            &entity,
            archived_status,
            actor.user_id,
            ReasonUpdate::Keep,
        )
        .await?
        .ok_or_else(|| concurrent_change(&entity))?;
        recorder::record_event(&mut tx, &archived, actions::ARCHIVED, actor.user_id).await?;
        None
    } else {
        if !EntityRepo::hard_delete(&mut tx, id).await? {
            return Err(concurrent_change(&entity));
        }
        recorder::record_family_event(
            &mut tx,
            kind,
            &entity.code,
            entity.version,
            actions::DELETED,
            actor.user_id,
        )
        .await?;
        Some(DeleteOutcome::Deleted { id })
    };
    family.sync_latest(&mut tx).await?;

    let rows = family.verify(&mut tx).await?;
    tx.commit().await?;

    tracing::info!(
        entity_id = id,
        kind = %kind,
        code = %entity.code,
        version = entity.version,
        archived = outcome.is_none(),
        user_id = actor.user_id,
        "Deleted"
    );

    match outcome {
        Some(deleted) => Ok(deleted),
        None => Ok(DeleteOutcome::Archived {
            entity: take_row(rows, kind, id)?,
        }),
    }
}
