//! Handlers for curriculum entities: create, read, branch, edit, delete.
//!
//! Every handler is generic over the payload type, which fixes the entity
//! kind; the same functions serve `/courses` and `/degrees`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use curricula_core::curriculum::CurriculumPayload;
use curricula_core::types::DbId;
use curricula_db::models::curriculum_entity::{CreateEntityRequest, ListEntitiesParams};
use serde_json::{Map, Value};

use crate::engine::{approval, versions};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireStaff;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/{kind}
///
/// Create version 1 of a new family as a draft. Every body key other than
/// `code` and `department_id` is a payload field.
pub async fn create<P: CurriculumPayload>(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
    Json(input): Json<CreateEntityRequest>,
) -> AppResult<impl IntoResponse> {
    let entity = versions::create_entity::<P>(&state.pool, &user.actor(), input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: entity })))
}

/// GET /api/v1/{kind}
///
/// List versions visible to the caller. Supports `status`, `department_id`,
/// `code`, `latest_only`, `limit` and `offset`.
pub async fn list<P: CurriculumPayload>(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListEntitiesParams>,
) -> AppResult<impl IntoResponse> {
    let page = versions::list_entities(&state.pool, &user.actor(), P::KIND, params).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/{kind}/{id}
pub async fn get_by_id<P: CurriculumPayload>(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let entity = versions::get_entity(&state.pool, &user.actor(), P::KIND, id).await?;
    Ok(Json(DataResponse { data: entity }))
}

/// GET /api/v1/{kind}/{id}/versions
///
/// Every version of the entity's family, oldest first.
pub async fn list_versions<P: CurriculumPayload>(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let family = versions::list_versions(&state.pool, &user.actor(), P::KIND, id).await?;
    Ok(Json(DataResponse { data: family }))
}

/// PATCH /api/v1/{kind}/{id}
///
/// Shallow-merge the body into a draft's payload. `null` resets a field.
pub async fn update<P: CurriculumPayload>(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(patch): Json<Map<String, Value>>,
) -> AppResult<impl IntoResponse> {
    let entity = versions::edit_draft(&state.pool, &user.actor(), P::KIND, id, patch).await?;
    Ok(Json(DataResponse { data: entity }))
}

/// POST /api/v1/{kind}/{id}/create-version
///
/// Branch a new draft from an approved or active version.
pub async fn create_version<P: CurriculumPayload>(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let draft = versions::create_version(&state.pool, &user.actor(), P::KIND, id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: draft })))
}

/// DELETE /api/v1/{kind}/{id}
///
/// Remove a non-active version, or archive it if it was ever approved.
pub async fn delete<P: CurriculumPayload>(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let outcome = approval::delete(&state.pool, &user.actor(), P::KIND, id).await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// GET /api/v1/{kind}/{id}/timeline
///
/// Audit events and messages of this version, newest first.
pub async fn timeline<P: CurriculumPayload>(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let entries = versions::entity_timeline(&state.pool, &user.actor(), P::KIND, id).await?;
    Ok(Json(DataResponse { data: entries }))
}

/// GET /api/v1/{kind}/{id}/history
///
/// Audit events of the family the caller may see, newest first. Staff only.
pub async fn family_history<P: CurriculumPayload>(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let events = versions::family_history(&state.pool, &user.actor(), P::KIND, id).await?;
    Ok(Json(DataResponse { data: events }))
}
