//! Integration tests for signup and bearer authentication

use app_access::keys::API_KEY_PREFIX;
use app_access::repositories::ApiKeyRepository;
use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;
use wiremock::MockServer;

#[path = "test_utils/mod.rs"]
mod test_utils;

#[tokio::test]
async fn signup_returns_prefixed_key_once() {
    let broker = MockServer::start().await;
    let (app, _state) = test_utils::build_app(&broker.uri()).await.unwrap();

    let (status, body) = test_utils::send_request(
        &app,
        "POST",
        "/app-access/v1/signup",
        None,
        Some(json!({"agent_name": "research-agent"})),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::OK);
    let api_key = body["api_key"].as_str().unwrap();
    assert!(api_key.starts_with(API_KEY_PREFIX));
    // "rl_ak_" + 64 hex chars
    assert_eq!(api_key.len(), 70);
    assert!(body["agent_id"].as_str().unwrap().parse::<Uuid>().is_ok());
}

#[tokio::test]
async fn signup_rejects_blank_agent_name() {
    let broker = MockServer::start().await;
    let (app, _state) = test_utils::build_app(&broker.uri()).await.unwrap();

    let (status, body) = test_utils::send_request(
        &app,
        "POST",
        "/app-access/v1/signup",
        None,
        Some(json!({"agent_name": "   "})),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn issued_key_authenticates_protected_route() {
    let broker = MockServer::start().await;
    let (app, state) = test_utils::build_app(&broker.uri()).await.unwrap();
    let (api_key, _) = test_utils::issue_test_key(&state, "agent-a").await.unwrap();

    // An unsupported app passes authentication and fails at the app gate,
    // proving the key was accepted.
    let (status, body) = test_utils::send_request(
        &app,
        "POST",
        "/app-access/v1/connect",
        Some(&api_key),
        Some(json!({"app": "slack"})),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "UNSUPPORTED_APP");
}

#[tokio::test]
async fn missing_bearer_token_is_401() {
    let broker = MockServer::start().await;
    let (app, _state) = test_utils::build_app(&broker.uri()).await.unwrap();

    let (status, body) = test_utils::send_request(
        &app,
        "POST",
        "/app-access/v1/connect",
        None,
        Some(json!({"app": "gmail"})),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert!(body["trace_id"].is_string());
}

#[tokio::test]
async fn unknown_key_is_401() {
    let broker = MockServer::start().await;
    let (app, _state) = test_utils::build_app(&broker.uri()).await.unwrap();

    let (status, body) = test_utils::send_request(
        &app,
        "POST",
        "/app-access/v1/connect",
        Some("rl_ak_0000000000000000000000000000000000000000000000000000000000000000"),
        Some(json!({"app": "gmail"})),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn revoked_key_is_401() {
    let broker = MockServer::start().await;
    let (app, state) = test_utils::build_app(&broker.uri()).await.unwrap();
    let (api_key, key_id) = test_utils::issue_test_key(&state, "agent-b").await.unwrap();

    let repository = ApiKeyRepository::new(Arc::clone(&state.db));
    repository.revoke(&key_id).await.unwrap();

    let (status, body) = test_utils::send_request(
        &app,
        "POST",
        "/app-access/v1/connect",
        Some(&api_key),
        Some(json!({"app": "gmail"})),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn malformed_body_is_validation_failed() {
    let broker = MockServer::start().await;
    let (app, _state) = test_utils::build_app(&broker.uri()).await.unwrap();

    // Missing required field
    let (status, body) = test_utils::send_request(
        &app,
        "POST",
        "/app-access/v1/signup",
        None,
        Some(json!({"name": "wrong-field"})),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn public_routes_require_no_key() {
    let broker = MockServer::start().await;
    let (app, _state) = test_utils::build_app(&broker.uri()).await.unwrap();

    let (status, body) = test_utils::send_request(&app, "GET", "/app-access/v1/apps", None, None)
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);
    assert!(body["apps"].as_array().unwrap().len() >= 3);

    let (status, body) = test_utils::send_request(&app, "GET", "/", None, None)
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "app-access");
}
