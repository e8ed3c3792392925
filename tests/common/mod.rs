// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use std::sync::Arc;
use tiktok_crosspost::config::Config;
use tiktok_crosspost::db::{FirestoreDb, InMemorySettingsStore};
use tiktok_crosspost::models::{CreatorInfo, PostingPreferences, TenantConnection};
use tiktok_crosspost::routes::create_router;
use tiktok_crosspost::services::PublishService;
use tiktok_crosspost::time_utils::utc_date;
use tiktok_crosspost::AppState;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Test config pointing the TikTok client at `api_url`.
#[allow(dead_code)]
pub fn test_config(api_url: &str) -> Config {
    Config {
        tiktok_api_url: api_url.to_string(),
        ..Config::default()
    }
}

/// Publish service wired to a mock TikTok and an in-memory store.
#[allow(dead_code)]
pub fn test_publisher(server: &MockServer) -> (PublishService, Arc<InMemorySettingsStore>) {
    let store = Arc::new(InMemorySettingsStore::new());
    let publisher = PublishService::new(&test_config(&server.uri()), store.clone());
    (publisher, store)
}

/// Create a test app backed by an in-memory store.
/// Returns the router, the shared state and the store.
#[allow(dead_code)]
pub fn create_test_app(api_url: &str) -> (axum::Router, Arc<AppState>, Arc<InMemorySettingsStore>) {
    let store = Arc::new(InMemorySettingsStore::new());
    let state = Arc::new(AppState::new(test_config(api_url), store.clone()));
    (create_router(state.clone()), state, store)
}

/// A connected tenant whose token is valid for another hour.
#[allow(dead_code)]
pub fn connected_tenant(tenant_id: &str) -> TenantConnection {
    TenantConnection {
        tenant_id: tenant_id.to_string(),
        access_token: Some("act.valid".to_string()),
        refresh_token: Some("rft.valid".to_string()),
        expires_at: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp_millis(),
        posts_today: 0,
        posts_last_reset: today(),
        creator_info: CreatorInfo::default(),
        preferences: PostingPreferences::default(),
        updated_at: None,
    }
}

#[allow(dead_code)]
pub fn today() -> String {
    utc_date(chrono::Utc::now())
}

/// `{data, error: ok}` envelope.
#[allow(dead_code)]
pub fn ok_envelope(data: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "data": data,
        "error": { "code": "ok", "message": "", "log_id": "log-1" }
    })
}

/// Error envelope with the given code and message.
#[allow(dead_code)]
pub fn error_envelope(code: &str, message: &str) -> serde_json::Value {
    serde_json::json!({
        "data": {},
        "error": { "code": code, "message": message, "log_id": "log-2" }
    })
}

/// Creator info answering with `options`.
#[allow(dead_code)]
pub async fn mount_creator_info(server: &MockServer, options: &[&str]) {
    Mock::given(method("POST"))
        .and(path("/post/publish/creator_info/query/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(serde_json::json!({
            "creator_nickname": "creator",
            "privacy_level_options": options,
            "max_video_post_duration_sec": 300,
            "comment_disabled": false,
            "duet_disabled": false,
            "stitch_disabled": false
        }))))
        .mount(server)
        .await;
}

/// Status fetch that always reports processing.
#[allow(dead_code)]
pub async fn mount_status(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/post/publish/status/fetch/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(serde_json::json!({
            "status": "PROCESSING_DOWNLOAD"
        }))))
        .mount(server)
        .await;
}

/// Upload-init at `init_path` answering with `publish_id`, expected `times`.
#[allow(dead_code)]
pub async fn mount_init(server: &MockServer, init_path: &str, publish_id: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path(init_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(serde_json::json!({
            "publish_id": publish_id
        }))))
        .expect(times)
        .mount(server)
        .await;
}

/// JSON bodies of all requests the mock server saw on `request_path`.
#[allow(dead_code)]
pub async fn request_bodies(server: &MockServer, request_path: &str) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == request_path)
        .map(|r| serde_json::from_slice(&r.body).unwrap_or(serde_json::Value::Null))
        .collect()
}

/// POST an invocation through the router and decode the JSON body.
#[allow(dead_code)]
pub async fn invoke(
    app: axum::Router,
    token: Option<&str>,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/crosspost/tiktok")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let response = app
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}
