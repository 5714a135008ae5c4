pub mod curriculum;
pub mod health;
pub mod stats;

use axum::Router;
use curricula_core::curriculum::{CoursePayload, DegreePayload};

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /courses                                    list, create
/// /courses/{id}                               get, edit draft, delete
/// /courses/{id}/versions                      family versions
/// /courses/{id}/timeline                      events and messages
/// /courses/{id}/history                       family audit events
/// /courses/{id}/create-version                branch (POST)
/// /courses/{id}/submit                        submit (POST)
/// /courses/{id}/approve                       approve (POST)
/// /courses/{id}/reject                        reject (POST)
/// /courses/{id}/withdraw                      withdraw approval (POST)
/// /courses/{id}/publish                       publish (POST)
///
/// /degrees/...                                same as /courses
///
/// /stats                                      per-status counts
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/courses", curriculum::router::<CoursePayload>())
        .nest("/degrees", curriculum::router::<DegreePayload>())
        .nest("/stats", stats::router())
}
