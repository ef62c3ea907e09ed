//! # Account Linking Handler
//!
//! Binds the authenticated API key to an external account via a linking
//! token validated by the embedding application.

use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::AgentExtension;
use crate::error::{ApiError, validation_error};
use crate::handlers::AppJson;
use crate::server::AppState;

/// Request body for account linking
#[derive(Debug, Deserialize, ToSchema)]
pub struct LinkRequest {
    /// Opaque token issued by the embedding application
    pub linking_token: String,
}

/// Response for a successful link
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LinkResponse {
    /// Always "linked" on success
    pub status: String,
    /// External account id the key is now bound to
    pub external_account_id: String,
}

/// Link the calling API key to an external account
#[utoipa::path(
    post,
    path = "/app-access/v1/link",
    security(("bearer_auth" = [])),
    request_body = LinkRequest,
    responses(
        (status = 200, description = "Key linked to external account", body = LinkResponse),
        (status = 400, description = "Missing linking token", body = ApiError),
        (status = 401, description = "Missing or invalid API key, or invalid linking token", body = ApiError),
        (status = 501, description = "Account linking is not configured", body = ApiError)
    ),
    tag = "linking"
)]
pub async fn link_account(
    State(state): State<AppState>,
    AgentExtension(agent): AgentExtension,
    AppJson(request): AppJson<LinkRequest>,
) -> Result<Json<LinkResponse>, ApiError> {
    if request.linking_token.trim().is_empty() {
        return Err(validation_error(
            "Validation failed",
            serde_json::json!({ "linking_token": "linking_token must not be empty" }),
        ));
    }

    let link = state
        .linking_service()
        .link(&agent.id, &request.linking_token)
        .await?;

    Ok(Json(LinkResponse {
        status: "linked".to_string(),
        external_account_id: link.external_account_id,
    }))
}
