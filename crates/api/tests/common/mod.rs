#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use curricula_api::auth::jwt::{generate_access_token, JwtConfig};
use curricula_api::config::ServerConfig;
use curricula_api::routes;
use curricula_api::state::AppState;
use curricula_core::roles::Role;

// ---------------------------------------------------------------------------
// Callers
// ---------------------------------------------------------------------------

pub const DEPT_A: i64 = 1;
pub const DEPT_B: i64 = 2;

/// A caller identity baked into an access token.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub user_id: i64,
    pub role: Role,
    pub department_id: Option<i64>,
}

pub const FACULTY_A: Caller = Caller {
    user_id: 10,
    role: Role::Faculty,
    department_id: Some(DEPT_A),
};
pub const FACULTY_A2: Caller = Caller {
    user_id: 11,
    role: Role::Faculty,
    department_id: Some(DEPT_A),
};
pub const FACULTY_B: Caller = Caller {
    user_id: 12,
    role: Role::Faculty,
    department_id: Some(DEPT_B),
};
pub const HOD_A: Caller = Caller {
    user_id: 20,
    role: Role::Hod,
    department_id: Some(DEPT_A),
};
pub const HOD_B: Caller = Caller {
    user_id: 21,
    role: Role::Hod,
    department_id: Some(DEPT_B),
};
pub const ADMIN: Caller = Caller {
    user_id: 1,
    role: Role::Admin,
    department_id: None,
};
pub const STUDENT: Caller = Caller {
    user_id: 50,
    role: Role::Student,
    department_id: Some(DEPT_A),
};

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
        access_token_expiry_mins: 15,
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        database_url: String::new(),
        database_max_connections: 5,
        jwt: jwt_config(),
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
///
/// Mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack that production uses.
pub fn build_test_app(pool: PgPool) -> Router {
    let state = AppState {
        pool,
        config: Arc::new(test_config()),
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

pub fn token(caller: Caller) -> String {
    generate_access_token(caller.user_id, caller.role, caller.department_id, &jwt_config())
        .unwrap()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    caller: Option<Caller>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
        builder = builder.header(AUTHORIZATION, format!("Bearer {}", token(caller)));
    }
    let request = match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str, caller: Caller) -> Response {
    send(app, Method::GET, uri, Some(caller), None).await
}

pub async fn post(app: Router, uri: &str, caller: Caller) -> Response {
    send(app, Method::POST, uri, Some(caller), None).await
}

pub async fn post_json(app: Router, uri: &str, caller: Caller, body: Value) -> Response {
    send(app, Method::POST, uri, Some(caller), Some(body)).await
}

pub async fn patch_json(app: Router, uri: &str, caller: Caller, body: Value) -> Response {
    send(app, Method::PATCH, uri, Some(caller), Some(body)).await
}

pub async fn delete(app: Router, uri: &str, caller: Caller) -> Response {
    send(app, Method::DELETE, uri, Some(caller), None).await
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A course payload that passes the submission check.
pub fn complete_course(code: &str) -> Value {
    json!({
        "code": code,
        "name": format!("{code} Introduction"),
        "description": "Core first-year course",
        "credits": 6,
        "curriculum": "<p>Week 1: foundations</p>",
        "prerequisites": [],
        "learning_outcomes": ["Explain the basics"]
    })
}

/// A degree payload that passes the submission check.
pub fn complete_degree(code: &str) -> Value {
    json!({
        "code": code,
        "name": "Computer Science",
        "description": "Three-year programme",
        "degree_type": "BSc",
        "duration_years": 3,
        "total_credits": 360,
        "course_codes": ["CS101", "CS102"]
    })
}

/// POST a course as `caller` and return the created row.
pub async fn create_course(pool: &PgPool, caller: Caller, body: Value) -> Value {
    let response = post_json(build_test_app(pool.clone()), "/api/v1/courses", caller, body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

/// POST a lifecycle action on a course and return the response.
pub async fn course_action(pool: &PgPool, id: i64, action: &str, caller: Caller) -> Response {
    post(
        build_test_app(pool.clone()),
        &format!("/api/v1/courses/{id}/{action}"),
        caller,
    )
    .await
}

/// Run a course action that must succeed and return the resulting row.
pub async fn course_action_ok(pool: &PgPool, id: i64, action: &str, caller: Caller) -> Value {
    let response = course_action(pool, id, action, caller).await;
    let status = response.status();
    let json = body_json(response).await;
    assert!(status.is_success(), "{action} failed with {status}: {json}");
    json["data"].clone()
}

/// Create a complete course in department A and take it to `active`.
pub async fn active_course(pool: &PgPool, code: &str) -> Value {
    let created = create_course(pool, FACULTY_A, complete_course(code)).await;
    let id = created["id"].as_i64().unwrap();
    course_action_ok(pool, id, "submit", FACULTY_A).await;
    course_action_ok(pool, id, "approve", HOD_A).await;
    course_action_ok(pool, id, "publish", HOD_A).await
}

pub async fn get_course(pool: &PgPool, id: i64, caller: Caller) -> Value {
    let response = get(
        build_test_app(pool.clone()),
        &format!("/api/v1/courses/{id}"),
        caller,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"].clone()
}

/// Number of timeline entries of a course, as seen by its author.
pub async fn course_timeline_len(pool: &PgPool, id: i64) -> usize {
    let response = get(
        build_test_app(pool.clone()),
        &format!("/api/v1/courses/{id}/timeline"),
        FACULTY_A,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"].as_array().unwrap().len()
}
