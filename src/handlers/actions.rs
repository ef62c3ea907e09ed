//! # Action Dispatch Handler
//!
//! Executes a remote action for an authenticated agent after three gates:
//! the static allow-list must permit the action, no owner override may deny
//! it, and an active connection to the app must exist. Only then is the
//! broker asked to execute.

use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::allowlist;
use crate::auth::AgentExtension;
use crate::error::{ApiError, action_not_allowed, unsupported_app};
use crate::handlers::AppJson;
use crate::lifecycle::entity_id_for;
use crate::repositories::ScopeOverrideRepository;
use crate::server::AppState;

/// Request body for executing a remote action
#[derive(Debug, Deserialize, ToSchema)]
pub struct ActionRequest {
    /// Target application (e.g. "gmail")
    pub app: String,
    /// Remote action name (e.g. "GMAIL_SEND_EMAIL")
    pub action: String,
    /// Action arguments, passed through to the broker
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Response for an executed action
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActionResponse {
    /// Whether the broker reported the action as successful
    pub success: bool,
    /// Action result payload from the broker
    pub result: serde_json::Value,
}

/// Execute a remote action against a connected application
#[utoipa::path(
    post,
    path = "/app-access/v1/action",
    security(("bearer_auth" = [])),
    request_body = ActionRequest,
    responses(
        (status = 200, description = "Action executed", body = ActionResponse),
        (status = 400, description = "Unsupported app, action outside the allow-list, or no active connection", body = ApiError),
        (status = 401, description = "Missing or invalid API key", body = ApiError),
        (status = 403, description = "Action denied by owner override", body = ApiError),
        (status = 502, description = "Broker error", body = ApiError)
    ),
    tag = "actions"
)]
pub async fn execute_action(
    State(state): State<AppState>,
    AgentExtension(agent): AgentExtension,
    AppJson(request): AppJson<ActionRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    if !allowlist::is_app_supported(&request.app) {
        return Err(unsupported_app(&request.app));
    }

    // Gate 1: the static allow-list bounds what any key may ever invoke.
    if !allowlist::is_action_allowed(&request.app, &request.action) {
        return Err(action_not_allowed(
            StatusCode::BAD_REQUEST,
            &format!(
                "Action '{}' is not in the {} allow-list",
                request.action, request.app
            ),
        ));
    }

    // Gate 2: an explicit owner deny always wins; overrides can only narrow.
    let overrides = ScopeOverrideRepository::new(Arc::clone(&state.db));
    if let Some(record) = overrides
        .get(&agent.id, &request.app, &request.action)
        .await?
        && !record.allowed
    {
        return Err(action_not_allowed(
            StatusCode::FORBIDDEN,
            &format!(
                "Action '{}' has been denied for this key by the account owner",
                request.action
            ),
        ));
    }

    // Gate 3: an active connection must exist.
    let connection = state
        .connection_service()
        .require_active(&agent.id, &request.app)
        .await?;

    let broker_connection_id = connection
        .broker_connection_id
        .as_deref()
        .ok_or_else(|| crate::error::no_active_connection(&request.app))?;
    let entity_id = connection
        .broker_entity_id
        .clone()
        .unwrap_or_else(|| entity_id_for(&agent.id));

    let executed = state
        .broker
        .execute(
            broker_connection_id,
            &entity_id,
            &request.action,
            request.params,
        )
        .await?;

    tracing::info!(
        agent_id = %agent.id,
        app = %request.app,
        action = %request.action,
        success = executed.success,
        "Executed remote action"
    );

    Ok(Json(ActionResponse {
        success: executed.success,
        result: executed.result,
    }))
}
