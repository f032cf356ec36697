#![cfg(feature = "http-api")]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use widgetbot_core::config::Config;
use widgetbot_core::service::http::{create_router, AppState};
use widgetbot_core::service::InstanceService;
use widgetbot_core::settings::default_settings;
use widgetbot_core::store::MemoryInstanceStore;

fn app() -> Router {
    let service = InstanceService::new(Arc::new(MemoryInstanceStore::new()));
    create_router(Arc::new(AppState::new(Config::default(), service)))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", "owner-1");
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_instance(app: &Router) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/instances",
        Some(json!({ "name": "Docs Bot", "website_url": "https://docs.example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_schema_and_defaults() {
    let app = app();

    let (status, body) = send(&app, "GET", "/api/v1/settings/schema", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "InstanceSettings");

    let (_, body) = send(&app, "GET", "/api/v1/settings/schema?section=behavior", None).await;
    assert_eq!(body["title"], "BehaviorSettings");

    let (status, body) = send(&app, "GET", "/api/v1/settings/schema?section=bogus", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    let (_, body) = send(&app, "GET", "/api/v1/settings/defaults", None).await;
    assert_eq!(body, default_settings());
}

#[tokio::test]
async fn test_instance_lifecycle() {
    let app = app();
    let id = create_instance(&app).await;

    let (status, body) = send(&app, "GET", &format!("/api/v1/instances/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["settings"]["identity"]["name"], "Docs Bot");
    assert_eq!(body["owner_id"], "owner-1");

    let (_, body) = send(&app, "GET", "/api/v1/instances", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/v1/instances/{id}"),
        Some(json!({ "name": "Renamed", "is_active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Renamed");
    assert_eq!(body["is_active"], false);

    let (status, _) = send(&app, "DELETE", &format!("/api/v1/instances/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", &format!("/api/v1/instances/{id}/settings"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_update_settings_merges() {
    let app = app();
    let id = create_instance(&app).await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/v1/instances/{id}/settings"),
        Some(json!({ "appearance": { "theme": "dark" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appearance"]["theme"], "dark");
    assert_eq!(body["appearance"]["position"], "bottom-right");
    assert_eq!(body["identity"]["name"], "Docs Bot");
}

#[tokio::test]
async fn test_invalid_settings_are_rejected_before_writing() {
    let app = app();
    let id = create_instance(&app).await;
    let (_, before) = send(&app, "GET", &format!("/api/v1/instances/{id}/settings"), None).await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/v1/instances/{id}/settings"),
        Some(json!({
            "knowledge": { "crawling": { "depth": 9 } },
            "behavior": { "tone": "angry" }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Invalid settings");
    let errors = body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(
        errors[0],
        "knowledge: crawling.depth: ensure this value is less than or equal to 5"
    );

    let (_, after) = send(&app, "GET", &format!("/api/v1/instances/{id}/settings"), None).await;
    assert_eq!(after, before);
}

#[tokio::test]
async fn test_create_with_invalid_settings_creates_nothing() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/instances",
        Some(json!({
            "name": "Docs Bot",
            "website_url": "https://docs.example.com",
            "settings": { "behavior": { "tone": "angry" } }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Invalid settings");
    assert_eq!(
        body["errors"],
        json!([
            "behavior: tone: unexpected value; permitted: 'professional', 'friendly', 'technical', 'casual'"
        ])
    );

    let (status, body) = send(&app, "GET", "/api/v1/instances", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_instance_update_with_invalid_settings_changes_nothing() {
    let app = app();
    let id = create_instance(&app).await;
    let (_, before) = send(&app, "GET", &format!("/api/v1/instances/{id}"), None).await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/v1/instances/{id}"),
        Some(json!({
            "name": "Renamed",
            "settings": { "compliance": { "data_retention_days": 0 } }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["errors"],
        json!(["compliance: data_retention_days: ensure this value is greater than or equal to 1"])
    );

    let (_, after) = send(&app, "GET", &format!("/api/v1/instances/{id}"), None).await;
    assert_eq!(after, before);
    assert_eq!(after["name"], "Docs Bot");
}

#[tokio::test]
async fn test_section_update_and_reset() {
    let app = app();
    let id = create_instance(&app).await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/v1/instances/{id}/settings/behavior"),
        Some(json!({ "tone": "formal" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"][0].as_str().unwrap().starts_with("behavior: tone:"));

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/v1/instances/{id}/settings/behavior"),
        Some(json!({ "tone": "technical" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["behavior"]["tone"], "technical");
    assert_eq!(body["behavior"]["language"], "en");

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/v1/instances/{id}/settings/bogus"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"], json!(["Invalid settings section: bogus"]));

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/instances/{id}/settings/reset"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, default_settings());
}

#[tokio::test]
async fn test_unknown_instance_is_404() {
    let app = app();
    let (status, body) = send(
        &app,
        "PUT",
        "/api/v1/instances/missing/settings/behavior",
        Some(json!({ "tone": "casual" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Storage error: Instance not found: missing");
}
