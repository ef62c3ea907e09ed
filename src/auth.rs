//! # Authentication
//!
//! Bearer authentication for agent-facing endpoints. The presented token is
//! an issued API key; it is hashed and resolved against the credential
//! store, and the matching key record is made available to handlers through
//! [`AgentExtension`]. Revoked keys authenticate exactly like unknown ones.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::error::{ApiError, unauthorized, unauthorized_with_trace_id};
use crate::keys::hash_api_key;
use crate::models::api_key;
use crate::repositories::ApiKeyRepository;
use crate::server::AppState;
use crate::telemetry::TraceContext;

/// Extractor for the authenticated API key record from request extensions
#[derive(Debug, Clone)]
pub struct AgentExtension(pub api_key::Model);

/// Authentication middleware that resolves bearer API keys
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Extract trace_id from request context for consistent error responses
    let trace_id = request
        .extensions()
        .get::<TraceContext>()
        .map(|ctx| ctx.trace_id.clone());

    // Digest the presented token before the request is moved on.
    let token_hash = hash_api_key(extract_bearer_token(
        request.headers(),
        trace_id.clone(),
    )?);

    let repository = ApiKeyRepository::new(Arc::clone(&state.db));
    let record = repository
        .find_by_hash(&token_hash)
        .await?
        .filter(|key| key.status == api_key::status::ACTIVE)
        .ok_or_else(|| match trace_id {
            Some(trace_id) => {
                unauthorized_with_trace_id(Some("Invalid or revoked API key"), trace_id)
            }
            None => unauthorized(Some("Invalid or revoked API key")),
        })?;

    tracing::debug!(agent_id = %record.id, agent_name = %record.agent_name, "Authenticated agent request");

    request.extensions_mut().insert(AgentExtension(record));

    Ok(next.run(request).await)
}

fn extract_bearer_token(
    headers: &HeaderMap,
    trace_id: Option<String>,
) -> Result<&str, ApiError> {
    let fail = |message: &str| match trace_id.clone() {
        Some(trace_id) => unauthorized_with_trace_id(Some(message), trace_id),
        None => unauthorized(Some(message)),
    };

    headers
        .get(AUTHORIZATION)
        .ok_or_else(|| fail("Missing Authorization header"))
        .and_then(|value| {
            value
                .to_str()
                .map_err(|_| fail("Invalid Authorization header"))
        })
        .and_then(|header| {
            header
                .strip_prefix("Bearer ")
                .ok_or_else(|| fail("Authorization header must use Bearer scheme"))
        })
}

impl<S> FromRequestParts<S> for AgentExtension
where
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AgentExtension>()
            .cloned()
            .ok_or_else(|| unauthorized(Some("Authentication required")))
    }
}
