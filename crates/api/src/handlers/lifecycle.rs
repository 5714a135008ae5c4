//! Handlers for the approval workflow.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use curricula_core::curriculum::CurriculumPayload;
use curricula_core::types::DbId;
use curricula_db::models::curriculum_entity::{RejectRequest, SubmitRequest};

use crate::engine::approval;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireApprover, RequireStaff};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/{kind}/{id}/submit
///
/// Submit a draft for approval. The body `{ "message": "..." }` is optional.
pub async fn submit<P: CurriculumPayload>(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let input: SubmitRequest = if body.iter().all(u8::is_ascii_whitespace) {
        SubmitRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid submit body: {e}")))?
    };

    let entity = approval::submit(
        &state.pool,
        &user.actor(),
        P::KIND,
        id,
        input.message.as_deref(),
    )
    .await?;
    Ok(Json(DataResponse { data: entity }))
}

/// POST /api/v1/{kind}/{id}/approve
pub async fn approve<P: CurriculumPayload>(
    RequireApprover(user): RequireApprover,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let entity = approval::approve(&state.pool, &user.actor(), P::KIND, id).await?;
    Ok(Json(DataResponse { data: entity }))
}

/// POST /api/v1/{kind}/{id}/reject
///
/// Body: `{ "reason": "..." }`, 10 to 500 characters after trimming.
pub async fn reject<P: CurriculumPayload>(
    RequireApprover(user): RequireApprover,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<RejectRequest>,
) -> AppResult<impl IntoResponse> {
    let entity = approval::reject(&state.pool, &user.actor(), P::KIND, id, &input.reason).await?;
    Ok(Json(DataResponse { data: entity }))
}

/// POST /api/v1/{kind}/{id}/withdraw
pub async fn withdraw<P: CurriculumPayload>(
    RequireApprover(user): RequireApprover,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let entity = approval::withdraw(&state.pool, &user.actor(), P::KIND, id).await?;
    Ok(Json(DataResponse { data: entity }))
}

/// POST /api/v1/{kind}/{id}/publish
///
/// Activate an approved version; the previous active version is archived.
pub async fn publish<P: CurriculumPayload>(
    RequireApprover(user): RequireApprover,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let entity = approval::publish(&state.pool, &user.actor(), P::KIND, id).await?;
    Ok(Json(DataResponse { data: entity }))
}
