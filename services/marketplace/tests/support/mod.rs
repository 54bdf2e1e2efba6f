//! Shared helpers for HTTP-level tests

#![allow(dead_code)]

use axum::http::{HeaderName, HeaderValue, StatusCode, header};
use axum_test::TestServer;
use common::database::init_memory_pool;
use marketplace::{
    config::AppConfig, routes::create_router, run_migrations, state::AppState,
    uploads::UploadStore,
};
use serde_json::{Value, json};
use std::path::Path;
use tempfile::TempDir;

pub const PASSWORD: &str = "correct horse";

/// Router over an in-memory database and a temporary upload directory
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub upload_dir: TempDir,
}

pub async fn spawn_app() -> TestApp {
    let pool = init_memory_pool().await.unwrap();
    run_migrations(&pool).await.unwrap();

    let upload_dir = tempfile::tempdir().unwrap();
    let uploads = UploadStore::init(upload_dir.path()).await.unwrap();

    let config = AppConfig {
        upload_dir: upload_dir.path().to_path_buf(),
        session_secret: Some("integration-test-session-secret-0123456789".to_string()),
        seed_enabled: false,
        ..Default::default()
    };

    let state = AppState::new(pool, uploads, config);
    let server = TestServer::new(create_router(state.clone()).unwrap()).unwrap();

    TestApp {
        server,
        state,
        upload_dir,
    }
}

/// Register an account and return its ID
pub async fn register(server: &TestServer, username: &str) -> i64 {
    let response = server
        .post("/api/register")
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": PASSWORD,
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["user"]["id"].as_i64().unwrap()
}

/// Log in and return the session token
pub async fn login(server: &TestServer, username: &str) -> String {
    let response = server
        .post("/api/login")
        .json(&json!({ "username": username, "password": PASSWORD }))
        .await;

    response.assert_status(StatusCode::OK);
    response.json::<Value>()["token"]
        .as_str()
        .unwrap()
        .to_string()
}

pub async fn register_and_login(server: &TestServer, username: &str) -> (i64, String) {
    let id = register(server, username).await;
    let token = login(server, username).await;
    (id, token)
}

pub fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    )
}

/// Regular files anywhere under `dir`
pub fn stored_files(dir: &Path) -> Vec<String> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).unwrap() {
        let entry = entry.unwrap();
        let path = entry.path();
        if path.is_dir() {
            files.extend(stored_files(&path));
        } else {
            files.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    files
}
