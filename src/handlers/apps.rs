//! # Apps Handler
//!
//! Read-only view of the static allow-list: which applications are
//! supported and which remote actions each one permits.

use axum::response::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::allowlist;

/// One supported application and its permitted actions
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AppInfo {
    /// Application name (e.g. "gmail")
    pub app: String,
    /// Ordered list of permitted remote action names
    pub actions: Vec<String>,
}

/// Response listing all supported applications
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AppsResponse {
    pub apps: Vec<AppInfo>,
}

/// List supported applications and their action allow-lists
#[utoipa::path(
    get,
    path = "/app-access/v1/apps",
    responses(
        (status = 200, description = "Supported applications", body = AppsResponse)
    ),
    tag = "apps"
)]
pub async fn list_apps() -> Json<AppsResponse> {
    let apps = allowlist::app_actions()
        .iter()
        .map(|(app, actions)| AppInfo {
            app: (*app).to_string(),
            actions: actions.iter().map(|action| (*action).to_string()).collect(),
        })
        .collect();

    Json(AppsResponse { apps })
}
