//! Test utilities for integration tests
#![allow(dead_code)]

use std::sync::Arc;

use axum::{Router, body::Body};
use tempfile::TempDir;
use tokio_rusqlite::Connection;

use iguana::api::routes::user::db::{create_session, get_or_create_user};
use iguana::api::{AppState, SESSION_COOKIE, app};
use iguana::core::AppConfig;
use iguana::core::db::{async_db, initialize_db};
use iguana::llm::Provider;

pub const TEST_MODEL: &str = "gemini-test";

/// Path the app calls on the LLM upstream for every prompt.
pub fn completion_path() -> String {
    format!("/v1beta/models/{}:generateContent", TEST_MODEL)
}

/// A Gemini response body with `text` as the only candidate.
pub fn gemini_body(text: &str) -> String {
    serde_json::json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
    })
    .to_string()
}

pub struct TestApp {
    pub router: Router,
    pub db: Connection,
    // Removed from disk when dropped
    _dir: TempDir,
}

impl TestApp {
    /// Create a user with a fresh session and return the cookie header
    /// value that authenticates as them.
    pub async fn login(&self, email: &str) -> String {
        let user_id = get_or_create_user(&self.db, email, Some("Test User"))
            .await
            .expect("Failed to create user");
        let token = create_session(&self.db, user_id)
            .await
            .expect("Failed to create session");
        format!("{}={}", SESSION_COOKIE, token)
    }
}

/// Creates a test application backed by a temporary database, calling
/// the LLM upstream at `upstream_url`.
pub async fn test_app(upstream_url: &str) -> TestApp {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("db");
    std::fs::create_dir_all(&db_path).expect("Failed to create db directory");
    let db_path = db_path.to_str().unwrap().to_string();

    let db = async_db(&db_path)
        .await
        .expect("Failed to connect to async db");
    db.call(|conn| {
        initialize_db(conn).expect("Failed to migrate db");
        Ok(())
    })
    .await
    .unwrap();

    let app_config = AppConfig {
        storage_path: dir.path().display().to_string(),
        db_path,
        llm_provider: Provider::Gemini,
        llm_api_hostname: upstream_url.to_string(),
        llm_api_key: String::from("test-api-key"),
        llm_model: String::from(TEST_MODEL),
        prompt_template: String::from("{prompt}"),
        session_ttl_hours: 24,
    };
    let app_state = AppState::new(db.clone(), app_config);
    TestApp {
        router: app(Arc::new(app_state)),
        db,
        _dir: dir,
    }
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not utf-8")
}

pub async fn body_to_json(body: Body) -> serde_json::Value {
    serde_json::from_str(&body_to_string(body).await).expect("Body is not json")
}
