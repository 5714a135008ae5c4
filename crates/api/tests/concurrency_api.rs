//! Racing writers against one family.

mod common;

use axum::http::StatusCode;
use common::{
    active_course, body_json, build_test_app, complete_course, course_action, course_action_ok,
    get_course, post_json, FACULTY_A, FACULTY_A2, HOD_A,
};
use futures::future::join_all;
use sqlx::PgPool;

const RACERS: usize = 5;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_create_version_admits_one(pool: PgPool) {
    let active = active_course(&pool, "CS101").await;
    let id = active["id"].as_i64().unwrap();

    let callers = [FACULTY_A, FACULTY_A2];
    let responses = join_all(
        (0..RACERS).map(|i| course_action(&pool, id, "create-version", callers[i % 2])),
    )
    .await;

    let mut created = 0;
    let mut conflicts = 0;
    for response in responses {
        match response.status() {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => {
                assert_eq!(body_json(response).await["code"], "CONFLICT");
                conflicts += 1;
            }
            other => panic!("unexpected status {other}"),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(conflicts, RACERS - 1);

    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM curriculum_entities WHERE code = 'CS101'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(count, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_publish_keeps_one_active(pool: PgPool) {
    let v1 = active_course(&pool, "CS101").await;
    let v1_id = v1["id"].as_i64().unwrap();
    let v2 = course_action_ok(&pool, v1_id, "create-version", FACULTY_A).await;
    let v2_id = v2["id"].as_i64().unwrap();
    course_action_ok(&pool, v2_id, "submit", FACULTY_A).await;
    course_action_ok(&pool, v2_id, "approve", HOD_A).await;

    let responses =
        join_all((0..RACERS).map(|_| course_action(&pool, v2_id, "publish", HOD_A))).await;
    let published = responses
        .iter()
        .filter(|r| r.status() == StatusCode::OK)
        .count();
    assert_eq!(published, 1);
    assert!(responses
        .iter()
        .all(|r| r.status() == StatusCode::OK || r.status() == StatusCode::CONFLICT));

    assert_eq!(get_course(&pool, v1_id, FACULTY_A).await["status"], "archived");
    assert_eq!(get_course(&pool, v2_id, FACULTY_A).await["status"], "active");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_create_same_code_admits_one(pool: PgPool) {
    let responses = join_all((0..RACERS).map(|_| {
        post_json(
            build_test_app(pool.clone()),
            "/api/v1/courses",
            FACULTY_A,
            complete_course("CS101"),
        )
    }))
    .await;

    let created = responses
        .iter()
        .filter(|r| r.status() == StatusCode::CREATED)
        .count();
    assert_eq!(created, 1);
    assert!(responses
        .iter()
        .filter(|r| r.status() != StatusCode::CREATED)
        .all(|r| r.status() == StatusCode::CONFLICT));
}
