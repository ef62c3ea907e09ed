//! OAuth broker client
//!
//! HTTP client for the third-party connection-brokering service: initiate a
//! connection for an entity, poll a connection's status, and execute a
//! whitelisted remote action against it. All calls go out with the static
//! broker API key in an `x-api-key` header; any non-success response or
//! unexpected body shape surfaces as a [`BrokerError`] rather than a crash.

use serde_json::{Value, json};
use thiserror::Error;

use crate::error::{ApiError, broker_error, configuration_missing};
use crate::models::connection::status;

/// Error type for broker operations
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("broker returned status {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("no auth configuration found for app '{app}'; available: {available}")]
    ConfigMissing { app: String, available: String },
    #[error("broker request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected broker response shape: {0}")]
    MalformedResponse(String),
}

impl From<BrokerError> for ApiError {
    fn from(error: BrokerError) -> Self {
        match error {
            BrokerError::Upstream { status, body } => broker_error(Some(status), Some(body)),
            BrokerError::ConfigMissing { app, .. } => configuration_missing(
                axum::http::StatusCode::BAD_GATEWAY,
                &format!("No auth configuration resolvable for app '{}'", app),
            ),
            BrokerError::Transport(err) => {
                tracing::error!("Broker transport error: {:?}", err);
                broker_error(None, None)
            }
            BrokerError::MalformedResponse(detail) => broker_error(None, Some(detail)),
        }
    }
}

/// Result of initiating a connection with the broker
#[derive(Debug, Clone)]
pub struct InitiateResult {
    /// Broker-assigned connection id
    pub connection_id: String,
    /// User-facing authorization URL to complete the OAuth flow
    pub auth_url: String,
}

/// Result of executing a remote action through the broker
#[derive(Debug, Clone)]
pub struct ExecuteResult {
    pub success: bool,
    pub result: Value,
}

/// Maps the broker's status vocabulary onto the internal one.
///
/// Total by construction: recognized statuses map to the internal
/// vocabulary, anything else passes through lower-cased so an unknown
/// broker state is observable instead of crashing the reconciliation path.
pub fn map_broker_status(raw: &str) -> String {
    let normalized = raw.to_lowercase();
    match normalized.as_str() {
        "initializing" | "initiated" => status::INITIATED.to_string(),
        "active" => status::ACTIVE.to_string(),
        "expired" => status::EXPIRED.to_string(),
        "failed" => status::FAILED.to_string(),
        _ => normalized,
    }
}

/// Client for the OAuth broker's REST API
#[derive(Debug, Clone)]
pub struct BrokerClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl BrokerClient {
    /// Creates a new broker client against the given API base URL
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Initiates a brokered connection for an entity and app.
    ///
    /// Resolves the broker-side auth configuration first, then requests a
    /// new connected account for it, returning the broker's connection id
    /// and the user-facing authorization URL.
    pub async fn initiate(&self, entity_id: &str, app: &str) -> Result<InitiateResult, BrokerError> {
        let auth_config_id = self.resolve_auth_config(app).await?;

        let response = self
            .http
            .post(format!("{}/connected_accounts/link", self.base_url))
            .header("x-api-key", &self.api_key)
            .json(&json!({
                "auth_config_id": auth_config_id,
                "user_id": entity_id,
            }))
            .send()
            .await?;

        let data = Self::read_json(response).await?;

        let connection_id = data
            .get("connected_account_id")
            .or_else(|| data.get("id"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                BrokerError::MalformedResponse(
                    "link response missing connected_account_id/id".to_string(),
                )
            })?
            .to_string();
        let auth_url = data
            .get("redirect_url")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(InitiateResult {
            connection_id,
            auth_url,
        })
    }

    /// Fetches the current raw status string of a brokered connection, lower-cased
    pub async fn poll_status(&self, broker_connection_id: &str) -> Result<String, BrokerError> {
        let response = self
            .http
            .get(format!(
                "{}/connected_accounts/{}",
                self.base_url, broker_connection_id
            ))
            .header("x-api-key", &self.api_key)
            .send()
            .await?;

        let data = Self::read_json(response).await?;

        Ok(data
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_lowercase())
    }

    /// Executes a named remote action against a brokered connection
    pub async fn execute(
        &self,
        broker_connection_id: &str,
        entity_id: &str,
        action_name: &str,
        params: Value,
    ) -> Result<ExecuteResult, BrokerError> {
        let response = self
            .http
            .post(format!("{}/tools/execute/{}", self.base_url, action_name))
            .header("x-api-key", &self.api_key)
            .json(&json!({
                "connected_account_id": broker_connection_id,
                "entity_id": entity_id,
                "arguments": params,
            }))
            .send()
            .await?;

        let data = Self::read_json(response).await?;

        // Older broker deployments spell the flag "successfull"; absence
        // means success.
        let success = data
            .get("successfull")
            .or_else(|| data.get("successful"))
            .and_then(Value::as_bool)
            .unwrap_or(true);
        let result = data.get("data").cloned().unwrap_or(data);

        Ok(ExecuteResult { success, result })
    }

    /// Looks up the broker auth configuration id for an app.
    ///
    /// The broker is not guaranteed to respect the toolkit_slugs[] filter
    /// and may return every configured auth config, so the response is
    /// re-filtered client-side by toolkit slug, app name, or name prefix
    /// (e.g. "github-ac-sy2" matches "github").
    async fn resolve_auth_config(&self, app: &str) -> Result<String, BrokerError> {
        let response = self
            .http
            .get(format!("{}/auth_configs", self.base_url))
            .query(&[("toolkit_slugs[]", app)])
            .header("x-api-key", &self.api_key)
            .send()
            .await?;

        let data = Self::read_json(response).await?;

        let items = data.get("items").cloned().unwrap_or(data);
        let configs: Vec<Value> = match items {
            Value::Array(configs) => configs,
            _ => Vec::new(),
        };

        let matched = configs.iter().find(|config| {
            config.get("toolkit_slug").and_then(Value::as_str) == Some(app)
                || config.get("app_name").and_then(Value::as_str) == Some(app)
                || config
                    .get("name")
                    .and_then(Value::as_str)
                    .is_some_and(|name| name.starts_with(app))
        });

        match matched.and_then(|config| config.get("id")).and_then(Value::as_str) {
            Some(id) => Ok(id.to_string()),
            None => {
                let available: Vec<Value> = configs
                    .iter()
                    .map(|config| {
                        json!({
                            "id": config.get("id"),
                            "name": config.get("name"),
                            "toolkit_slug": config.get("toolkit_slug"),
                        })
                    })
                    .collect();
                Err(BrokerError::ConfigMissing {
                    app: app.to_string(),
                    available: Value::Array(available).to_string(),
                })
            }
        }
    }

    /// Reads a broker response, turning non-success statuses and unparsable
    /// bodies into [`BrokerError`]s.
    async fn read_json(response: reqwest::Response) -> Result<Value, BrokerError> {
        let http_status = response.status();
        if !http_status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BrokerError::Upstream {
                status: http_status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|_| {
            BrokerError::MalformedResponse(format!("invalid JSON body: {}", truncate(&body)))
        })
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(200).collect()
}
