//! # Connection Handlers
//!
//! Agent-facing connection lifecycle: request a brokered connection to an
//! app, read its (reconciled) status, and refresh it after expiry.

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AgentExtension;
use crate::error::ApiError;
use crate::handlers::AppJson;
use crate::lifecycle::ConnectionOutcome;
use crate::models::connection;
use crate::server::AppState;

/// Request body for initiating a connection
#[derive(Debug, Deserialize, ToSchema)]
pub struct ConnectRequest {
    /// Application to connect (e.g. "gmail")
    pub app: String,
}

/// Response for a connection request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConnectResponse {
    /// Local connection identifier
    pub connection_id: Uuid,
    /// Current lifecycle status
    pub status: String,
    /// Authorization URL to complete the OAuth flow; absent when an
    /// active connection was reused
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_url: Option<String>,
}

/// Response for a status query
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConnectionStatusResponse {
    pub connection_id: Uuid,
    pub app: String,
    pub status: String,
}

impl From<connection::Model> for ConnectionStatusResponse {
    fn from(record: connection::Model) -> Self {
        Self {
            connection_id: record.id,
            app: record.app,
            status: record.status,
        }
    }
}

/// Request a connection to an application
///
/// Returns the existing connection when an active one is already in place;
/// otherwise initiates a new one with the broker and returns the
/// authorization URL the end user must visit.
#[utoipa::path(
    post,
    path = "/app-access/v1/connect",
    security(("bearer_auth" = [])),
    request_body = ConnectRequest,
    responses(
        (status = 200, description = "Connection active or initiated", body = ConnectResponse),
        (status = 400, description = "Unsupported application", body = ApiError),
        (status = 401, description = "Missing or invalid API key", body = ApiError),
        (status = 502, description = "Broker error", body = ApiError)
    ),
    tag = "connections"
)]
pub async fn request_connection(
    State(state): State<AppState>,
    AgentExtension(agent): AgentExtension,
    AppJson(request): AppJson<ConnectRequest>,
) -> Result<Json<ConnectResponse>, ApiError> {
    let service = state.connection_service();

    let response = match service.request_connection(&agent.id, &request.app).await? {
        ConnectionOutcome::Existing(record) => ConnectResponse {
            connection_id: record.id,
            status: record.status,
            auth_url: None,
        },
        ConnectionOutcome::Initiated {
            connection,
            auth_url,
        } => ConnectResponse {
            connection_id: connection.id,
            status: connection.status,
            auth_url: Some(auth_url),
        },
    };

    Ok(Json(response))
}

/// Get the current status of a connection
///
/// While the connection is pending the broker is polled and any terminal
/// status is persisted before responding.
#[utoipa::path(
    get,
    path = "/app-access/v1/connect/{id}/status",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Connection identifier")
    ),
    responses(
        (status = 200, description = "Connection status", body = ConnectionStatusResponse),
        (status = 401, description = "Missing or invalid API key", body = ApiError),
        (status = 404, description = "Connection not found", body = ApiError),
        (status = 502, description = "Broker error", body = ApiError)
    ),
    tag = "connections"
)]
pub async fn connection_status(
    State(state): State<AppState>,
    AgentExtension(agent): AgentExtension,
    Path(id): Path<Uuid>,
) -> Result<Json<ConnectionStatusResponse>, ApiError> {
    let service = state.connection_service();
    let record = service.get_status(&agent.id, &id).await?;

    Ok(Json(record.into()))
}

/// Refresh a connection
///
/// Re-initiates the OAuth flow in place: the connection keeps its id, gets
/// a fresh broker connection and goes back to `initiated`.
#[utoipa::path(
    post,
    path = "/app-access/v1/connect/{id}/refresh",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Connection identifier")
    ),
    responses(
        (status = 200, description = "Connection re-initiated", body = ConnectResponse),
        (status = 401, description = "Missing or invalid API key", body = ApiError),
        (status = 404, description = "Connection not found", body = ApiError),
        (status = 502, description = "Broker error", body = ApiError)
    ),
    tag = "connections"
)]
pub async fn refresh_connection(
    State(state): State<AppState>,
    AgentExtension(agent): AgentExtension,
    Path(id): Path<Uuid>,
) -> Result<Json<ConnectResponse>, ApiError> {
    let service = state.connection_service();
    let (record, auth_url) = service.refresh(&agent.id, &id).await?;

    Ok(Json(ConnectResponse {
        connection_id: record.id,
        status: record.status,
        auth_url: Some(auth_url),
    }))
}
