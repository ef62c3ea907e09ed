//! # Signup Handler
//!
//! Issues a new agent API key. The plaintext key appears only in this
//! response; afterwards only its digest exists server-side.

use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, validation_error};
use crate::handlers::AppJson;
use crate::repositories::ApiKeyRepository;
use crate::server::AppState;

/// Request body for agent signup
#[derive(Debug, Deserialize, ToSchema)]
pub struct SignupRequest {
    /// Human-readable name for the agent
    pub agent_name: String,
}

/// Response for a successful signup
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SignupResponse {
    /// Plaintext API key; shown exactly once
    pub api_key: String,
    /// Identifier of the newly created agent key
    pub agent_id: Uuid,
}

/// Register a new agent and issue its API key
#[utoipa::path(
    post,
    path = "/app-access/v1/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Agent registered; key returned once", body = SignupResponse),
        (status = 400, description = "Invalid agent name", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "signup"
)]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(request): AppJson<SignupRequest>,
) -> Result<Json<SignupResponse>, ApiError> {
    let agent_name = request.agent_name.trim();
    if agent_name.is_empty() {
        return Err(validation_error(
            "Validation failed",
            serde_json::json!({ "agent_name": "agent_name must not be empty" }),
        ));
    }
    if agent_name.len() > 128 {
        return Err(validation_error(
            "Validation failed",
            serde_json::json!({ "agent_name": "agent_name must be at most 128 characters" }),
        ));
    }

    let repository = ApiKeyRepository::new(Arc::clone(&state.db));
    let (api_key, record) = repository.issue(agent_name).await?;

    tracing::info!(agent_id = %record.id, agent_name = %record.agent_name, "Issued new agent API key");

    Ok(Json(SignupResponse {
        api_key,
        agent_id: record.id,
    }))
}
