#![allow(dead_code)]

use std::{path::Path, sync::Arc, time::Duration};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use moviehub::{AppState, config::Config, db, proxy, router, seed};
use serde_json::Value;
use tower::ServiceExt;

pub const DEMO_PHONE: &str = seed::DEMO_PHONE;
pub const DEMO_PASSWORD: &str = seed::DEMO_PASSWORD;

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        db_max_connections: 1,
        jwt_secret: "test-secret".to_string(),
        bcrypt_cost: 4,
        proxy_rps: 100,
        ..Config::default()
    }
}

/// Migrated in-memory database with the demo catalog loaded.
pub async fn test_state() -> Arc<AppState> {
    state_with(test_config()).await
}

/// Like [`test_state`], but backed by a SQLite file under `dir` with a pool of
/// `max_connections`, so requests really run side by side.
pub async fn file_state(dir: &Path, max_connections: u32) -> Arc<AppState> {
    let url = format!("sqlite://{}?mode=rwc", dir.join("moviehub.db").display());
    state_with(Config { database_url: url, db_max_connections: max_connections, ..test_config() })
        .await
}

async fn state_with(config: Config) -> Arc<AppState> {
    let config = Arc::new(config);
    let db = db::connect_and_migrate(&config.database_url, config.db_max_connections)
        .await
        .expect("Failed to init DB");
    seed::seed_demo_data(&db, config.bcrypt_cost).await.expect("Failed to seed demo data");
    let http = proxy::build_client(Duration::from_secs(5)).expect("Failed to build client");
    Arc::new(AppState::new(config, db, http))
}

pub async fn test_app() -> Router {
    router(test_state().await)
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Sends one request and decodes the JSON envelope.
pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, request("GET", uri, None, None)).await
}

/// Logs in and returns `(user_id, token)`.
pub async fn login(app: &Router, phone: &str, password: &str) -> (i32, String) {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/api/users/login",
            None,
            Some(serde_json::json!({ "phone": phone, "password": password })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    let id = body["data"]["user"]["id"].as_i64().unwrap() as i32;
    let token = body["data"]["token"].as_str().unwrap().to_string();
    (id, token)
}

pub async fn register(app: &Router, phone: &str) -> (i32, String) {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/api/users/register",
            None,
            Some(serde_json::json!({ "phone": phone, "password": "Aa123456" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {body}");
    let id = body["data"]["user"]["id"].as_i64().unwrap() as i32;
    let token = body["data"]["token"].as_str().unwrap().to_string();
    (id, token)
}
