//! Test utilities for database and router testing.
//!
//! Sets up in-memory SQLite databases with migrations applied and builds
//! application routers pointed at a stub broker.

use anyhow::Result;
use app_access::config::AppConfig;
use app_access::migration::{Migrator, MigratorTrait};
use app_access::repositories::ApiKeyRepository;
use app_access::server::{AppState, create_app};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use sea_orm::{Database, DatabaseConnection};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

#[allow(dead_code)]
pub async fn setup_test_db_arc() -> Result<Arc<DatabaseConnection>> {
    Ok(Arc::new(setup_test_db().await?))
}

/// Builds an [`AppState`] over a fresh database, pointing the broker client
/// at the given base URL (normally a wiremock server).
#[allow(dead_code)]
pub async fn build_state(broker_base_url: &str) -> Result<AppState> {
    let config = AppConfig {
        broker_base_url: broker_base_url.to_string(),
        broker_api_key: Some("test-broker-key".to_string()),
        database_url: "sqlite::memory:".to_string(),
        ..Default::default()
    };
    let db = setup_test_db_arc().await?;
    Ok(AppState::new(Arc::new(config), db))
}

/// Builds the full router over a fresh database and the given broker URL.
#[allow(dead_code)]
pub async fn build_app(broker_base_url: &str) -> Result<(Router, AppState)> {
    let state = build_state(broker_base_url).await?;
    Ok((create_app(state.clone()), state))
}

/// Issues an API key directly through the repository, returning
/// `(plaintext, key_id)`.
#[allow(dead_code)]
pub async fn issue_test_key(state: &AppState, agent_name: &str) -> Result<(String, Uuid)> {
    let repository = ApiKeyRepository::new(Arc::clone(&state.db));
    let (plaintext, record) = repository.issue(agent_name).await?;
    Ok((plaintext, record.id))
}

/// Drives one request through the router and returns `(status, json body)`.
///
/// `token` adds a bearer Authorization header; `body` adds a JSON body.
#[allow(dead_code)]
pub async fn send_request(
    app: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };

    Ok((status, json))
}
