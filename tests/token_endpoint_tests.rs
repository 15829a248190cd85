// Integration tests for the HTTP token endpoint

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::RejectingDirectory;
use http_body_util::BodyExt;
use meeting_room::config::StreamConfig;
use meeting_room::credentials::{CredentialIssuer, InMemoryUserDirectory};
use meeting_room::session::{HttpTokenSource, SessionError, TokenSource};
use meeting_room::{create_router, AppState};
use serde_json::{json, Value};
use std::future::IntoFuture;
use std::sync::Arc;
use tower::ServiceExt;

fn configured() -> StreamConfig {
    StreamConfig {
        api_key: Some("test-key".to_string()),
        api_secret: Some("test-secret".to_string()),
        ..StreamConfig::default()
    }
}

fn app(cfg: &StreamConfig) -> axum::Router {
    let issuer = CredentialIssuer::with_directory(cfg, Arc::new(InMemoryUserDirectory::new()));
    create_router(AppState::new(issuer))
}

async fn post_token(app: axum::Router, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/token")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_issue_token_ok() {
    let (status, body) = post_token(app(&configured()), json!({ "userId": "bob" })).await;

    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap();
    assert_eq!(token.split('.').count(), 3);
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_missing_secrets_returns_500() {
    let router = app(&StreamConfig::default());
    let (status, body) = post_token(router, json!({ "userId": "bob" })).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "API key or secret not configured" }));
}

#[tokio::test]
async fn test_upstream_failure_hides_detail() {
    let issuer = CredentialIssuer::with_directory(&configured(), Arc::new(RejectingDirectory));
    let router = create_router(AppState::new(issuer));

    let (status, body) = post_token(router, json!({ "userId": "bob" })).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "failed to generate token" }));
}

#[tokio::test]
async fn test_missing_user_id_returns_400() {
    let (status, body) = post_token(app(&configured()), json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "userId is required");
}

#[tokio::test]
async fn test_health_check() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app(&configured()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_http_token_source_round_trip() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(axum::serve(listener, app(&configured())).into_future());

    let source = HttpTokenSource::new(&format!("http://{}", addr));
    let token = source.fetch_token("alice").await.unwrap();

    assert_eq!(token.user_id(), "alice");
    assert!(!token.is_empty());
}

#[tokio::test]
async fn test_http_token_source_maps_failure_to_generic_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(axum::serve(listener, app(&StreamConfig::default())).into_future());

    let source = HttpTokenSource::new(&format!("http://{}/", addr));
    let result = source.fetch_token("alice").await;

    assert!(matches!(result, Err(SessionError::Unavailable)));
}
