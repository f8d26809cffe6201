#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use register_api::config::ServerConfig;
use register_api::router::build_app_router;
use register_api::session::{encode_session, SessionConfig, SESSION_COOKIE};
use register_api::state::AppState;
use register_core::checkin::{DayPolicy, LocationPolicy, PermissiveDayPolicy, PermissiveLocationPolicy};
use register_core::session::Session;
use register_core::types::Id;
use register_db::models::NewGroup;
use register_db::repositories::GroupRepo;
use register_sync::SyncDisabled;

/// Signing secret shared by the test router and cookie helpers.
pub const TEST_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

/// Build a test `ServerConfig` with safe defaults: permissive check-in
/// policies, external sync disabled, 30-second request timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        session: SessionConfig {
            secret: TEST_SECRET.to_string(),
            expiry_hours: 12,
        },
        enforce_radius: false,
        enforce_meeting_day: false,
        external_sync_enabled: false,
        sync_wait_secs: 1,
    }
}

/// Build the full application router with all middleware layers, using
/// the given database pool.
///
/// This mirrors the router construction in `main.rs` so integration
/// tests exercise the same middleware stack (CORS, request ID, timeout,
/// tracing, panic recovery) that production uses.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_policies(
        pool,
        Arc::new(PermissiveLocationPolicy),
        Arc::new(PermissiveDayPolicy),
    )
}

/// Same router, with explicit check-in policies for enforcement tests.
pub fn build_test_app_with_policies(
    pool: PgPool,
    location_policy: Arc<dyn LocationPolicy>,
    day_policy: Arc<dyn DayPolicy>,
) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        sync: Arc::new(SyncDisabled),
        location_policy,
        day_policy,
    };
    build_app_router(state, &config)
}

/// `Cookie` header value carrying a signed session.
pub fn session_cookie_for(session: &Session) -> String {
    let config = SessionConfig {
        secret: TEST_SECRET.to_string(),
        expiry_hours: 12,
    };
    let token = encode_session(session, &config).expect("session encoding should succeed");
    format!("{SESSION_COOKIE}={token}")
}

/// Send a GET request to the router.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a POST request with a JSON body.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a POST request with a JSON body and a `Cookie` header.
pub async fn post_json_with_cookie(
    app: Router,
    uri: &str,
    cookie: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, cookie)
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body into JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}

/// An in-person group at the given coordinates, meeting on `meeting_day`
/// (1=Monday..7=Sunday).
pub fn in_person_group(name: &str, latitude: f64, longitude: f64, meeting_day: i16) -> NewGroup {
    NewGroup {
        name: name.to_string(),
        format: "in-person".to_string(),
        street_address: Some("1 Test Street".to_string()),
        latitude: Some(latitude),
        longitude: Some(longitude),
        meeting_day: Some(meeting_day),
        meeting_time: chrono::NaiveTime::from_hms_opt(19, 0, 0),
        ..NewGroup::default()
    }
}

/// An online group meeting on `meeting_day`.
pub fn online_group(name: &str, meeting_day: i16) -> NewGroup {
    NewGroup {
        name: name.to_string(),
        format: "online".to_string(),
        meeting_day: Some(meeting_day),
        meeting_time: chrono::NaiveTime::from_hms_opt(20, 0, 0),
        ..NewGroup::default()
    }
}

pub async fn seed_group(pool: &PgPool, group: &NewGroup) -> Id {
    GroupRepo::insert(pool, group)
        .await
        .expect("group insert should succeed")
}

/// The `register_session=...` pair from a `Set-Cookie` header, ready to
/// send back in a `Cookie` header.
pub fn extract_session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .next()
        .map(str::to_string)
}
