//! Route definitions shared by `/courses` and `/degrees`.

use axum::routing::{get, post};
use axum::Router;
use curricula_core::curriculum::CurriculumPayload;

use crate::handlers::{curriculum, lifecycle};
use crate::state::AppState;

/// Routes for one entity kind, selected by its payload type.
///
/// ```text
/// GET    /                       list
/// POST   /                       create
/// GET    /{id}                   get_by_id
/// PATCH  /{id}                   update
/// DELETE /{id}                   delete
/// GET    /{id}/versions          list_versions
/// GET    /{id}/timeline          timeline
/// GET    /{id}/history           family_history
/// POST   /{id}/create-version    create_version
/// POST   /{id}/submit            submit
/// POST   /{id}/approve           approve
/// POST   /{id}/reject            reject
/// POST   /{id}/withdraw          withdraw
/// POST   /{id}/publish           publish
/// ```
pub fn router<P: CurriculumPayload>() -> Router<AppState> {
    Router::new()
        .route("/", get(curriculum::list::<P>).post(curriculum::create::<P>))
        .route(
            "/{id}",
            get(curriculum::get_by_id::<P>)
                .patch(curriculum::update::<P>)
                .delete(curriculum::delete::<P>),
        )
        .route("/{id}/versions", get(curriculum::list_versions::<P>))
        .route("/{id}/timeline", get(curriculum::timeline::<P>))
        .route("/{id}/history", get(curriculum::family_history::<P>))
        .route("/{id}/create-version", post(curriculum::create_version::<P>))
        .route("/{id}/submit", post(lifecycle::submit::<P>))
        .route("/{id}/approve", post(lifecycle::approve::<P>))
        .route("/{id}/reject", post(lifecycle::reject::<P>))
        .route("/{id}/withdraw", post(lifecycle::withdraw::<P>))
        .route("/{id}/publish", post(lifecycle::publish::<P>))
}
