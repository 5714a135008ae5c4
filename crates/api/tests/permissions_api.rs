mod common;

use axum::http::{Method, StatusCode};
use common::{
    active_course, body_json, build_test_app, complete_course, course_action, course_action_ok,
    course_timeline_len, create_course, delete, get, patch_json, post_json, send, Caller, ADMIN,
    DEPT_B, FACULTY_A, FACULTY_A2, FACULTY_B, HOD_A, HOD_B, STUDENT,
};
use serde_json::json;
use sqlx::PgPool;

async fn pending_course(pool: &PgPool, code: &str) -> i64 {
    let created = create_course(pool, FACULTY_A, complete_course(code)).await;
    let id = created["id"].as_i64().unwrap();
    course_action_ok(pool, id, "submit", FACULTY_A).await;
    id
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_missing_token_returns_401(pool: PgPool) {
    let response = send(
        build_test_app(pool),
        Method::GET,
        "/api/v1/courses",
        None,
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_other_department_cannot_review(pool: PgPool) {
    let id = pending_course(&pool, "CS101").await;
    let before = course_timeline_len(&pool, id).await;

    for caller in [FACULTY_B, HOD_B] {
        let response = course_action(&pool, id, "approve", caller).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["code"], "PERMISSION_ERROR");

        let response = post_json(
            build_test_app(pool.clone()),
            &format!("/api/v1/courses/{id}/reject"),
            caller,
            json!({"reason": "not my department"}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
    assert_eq!(course_timeline_len(&pool, id).await, before);

    course_action_ok(&pool, id, "approve", HOD_A).await;
    let before = course_timeline_len(&pool, id).await;
    let response = course_action(&pool, id, "publish", HOD_B).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(course_timeline_len(&pool, id).await, before);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_faculty_cannot_approve_own_department(pool: PgPool) {
    let id = pending_course(&pool, "CS101").await;

    let response = course_action(&pool, id, "approve", FACULTY_A).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "PERMISSION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_admin_reviews_any_department(pool: PgPool) {
    let id = pending_course(&pool, "CS101").await;

    course_action_ok(&pool, id, "approve", ADMIN).await;
    let published = course_action_ok(&pool, id, "publish", ADMIN).await;
    assert_eq!(published["status"], "active");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_student_cannot_author(pool: PgPool) {
    let response = post_json(
        build_test_app(pool.clone()),
        "/api/v1/courses",
        STUDENT,
        complete_course("CS101"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let active = active_course(&pool, "CS102").await;
    let id = active["id"].as_i64().unwrap();
    let response = course_action(&pool, id, "create-version", STUDENT).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_student_sees_only_active(pool: PgPool) {
    let active = active_course(&pool, "CS101").await;
    let draft = create_course(&pool, FACULTY_A, complete_course("CS102")).await;

    let response = get(
        build_test_app(pool.clone()),
        &format!("/api/v1/courses/{}", draft["id"]),
        STUDENT,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get(
        build_test_app(pool.clone()),
        &format!("/api/v1/courses/{}", active["id"]),
        STUDENT,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(build_test_app(pool.clone()), "/api/v1/courses", STUDENT).await;
    let page = body_json(response).await["data"].clone();
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["code"], "CS101");

    // Timeline and history are staff-only or visibility-checked.
    let response = get(
        build_test_app(pool.clone()),
        &format!("/api/v1/courses/{}/history", active["id"]),
        STUDENT,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_other_department_sees_active_but_not_drafts(pool: PgPool) {
    let active = active_course(&pool, "CS101").await;
    let draft = create_course(&pool, FACULTY_A, complete_course("CS102")).await;

    let response = get(
        build_test_app(pool.clone()),
        &format!("/api/v1/courses/{}", active["id"]),
        FACULTY_B,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(
        build_test_app(pool.clone()),
        &format!("/api/v1/courses/{}", draft["id"]),
        FACULTY_B,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Viewing is not authoring.
    let response = course_action(&pool, active["id"].as_i64().unwrap(), "create-version", FACULTY_B)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_department_colleague_can_edit_draft(pool: PgPool) {
    let draft = create_course(&pool, FACULTY_A, complete_course("CS101")).await;
    let uri = format!("/api/v1/courses/{}", draft["id"]);

    let response = patch_json(build_test_app(pool.clone()), &uri, FACULTY_A2, json!({"credits": 4}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await["data"].clone();
    assert_eq!(updated["updater_id"], FACULTY_A2.user_id);
    assert_eq!(updated["creator_id"], FACULTY_A.user_id);

    let response = patch_json(build_test_app(pool), &uri, FACULTY_B, json!({"credits": 5})).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_only_creator_or_hod_deletes(pool: PgPool) {
    let draft = create_course(&pool, FACULTY_A, complete_course("CS101")).await;
    let uri = format!("/api/v1/courses/{}", draft["id"]);

    let response = delete(build_test_app(pool.clone()), &uri, FACULTY_A2).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = delete(build_test_app(pool), &uri, HOD_A).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_staff_cannot_create_in_other_department(pool: PgPool) {
    let mut body = complete_course("CS101");
    body["department_id"] = json!(DEPT_B);

    let response = post_json(build_test_app(pool), "/api/v1/courses", FACULTY_A, body).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

async fn history(pool: &PgPool, id: i64, caller: Caller) -> Vec<serde_json::Value> {
    let response = get(
        build_test_app(pool.clone()),
        &format!("/api/v1/courses/{id}/history"),
        caller,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"].as_array().unwrap().clone()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_history_hides_other_departments_open_versions(pool: PgPool) {
    let v1 = active_course(&pool, "CS101").await;
    let v1_id = v1["id"].as_i64().unwrap();
    let v2 = course_action_ok(&pool, v1_id, "create-version", FACULTY_A).await;
    let v2_id = v2["id"].as_i64().unwrap();
    course_action_ok(&pool, v2_id, "submit", FACULTY_A).await;

    let outside = history(&pool, v1_id, FACULTY_B).await;
    assert!(!outside.is_empty());
    assert!(outside.iter().all(|e| e["entity_id"] == v1_id));
    assert!(outside.iter().all(|e| e["version"] == 1));

    let owning = history(&pool, v1_id, FACULTY_A).await;
    assert!(owning.iter().any(|e| e["entity_id"] == v2_id));
    assert_eq!(owning[0]["action"], "submitted");
    assert_eq!(owning.len(), outside.len() + 2);

    assert_eq!(history(&pool, v1_id, ADMIN).await.len(), owning.len());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_history_hides_deletions_from_other_departments(pool: PgPool) {
    let v1 = active_course(&pool, "CS101").await;
    let v1_id = v1["id"].as_i64().unwrap();
    let v2 = course_action_ok(&pool, v1_id, "create-version", FACULTY_A).await;
    let response = delete(
        build_test_app(pool.clone()),
        &format!("/api/v1/courses/{}", v2["id"]),
        FACULTY_A,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    assert!(history(&pool, v1_id, HOD_B)
        .await
        .iter()
        .all(|e| e["action"] != "deleted"));
    assert_eq!(history(&pool, v1_id, HOD_A).await[0]["action"], "deleted");
}
