use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::engine::stats::curriculum_stats;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/stats
///
/// Per-status counts of courses and degrees within the caller's scope.
pub async fn get_stats(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let stats = curriculum_stats(&state.pool, &user.actor()).await?;
    Ok(Json(DataResponse { data: stats }))
}
