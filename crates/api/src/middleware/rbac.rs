//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose role does not
//! meet the minimum requirement.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use curricula_core::error::CoreError;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires a staff role (`faculty`, `hod` or `admin`). Rejects with 403 otherwise.
///
/// ```ignore
/// async fn author_only(RequireStaff(user): RequireStaff) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireStaff(pub AuthUser);

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.role.is_staff() {
            return Err(AppError::Core(CoreError::Forbidden(
                "Faculty, HOD or Admin role required".into(),
            )));
        }
        Ok(RequireStaff(user))
    }
}

/// Requires `hod` or `admin`. Rejects with 403 otherwise.
pub struct RequireApprover(pub AuthUser);

impl FromRequestParts<AppState> for RequireApprover {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.role.is_approver() {
            return Err(AppError::Core(CoreError::Forbidden(
                "HOD or Admin role required".into(),
            )));
        }
        Ok(RequireApprover(user))
    }
}
