//! # Server Configuration
//!
//! This module contains the server setup and configuration for the App
//! Access API: shared state, the versioned router with its auth and trace
//! middleware, and the OpenAPI document.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::auth_middleware;
use crate::broker::BrokerClient;
use crate::config::AppConfig;
use crate::handlers;
use crate::lifecycle::ConnectionService;
use crate::linking::{LinkingService, LinkingTokenValidator};
use crate::repositories::{AccountLinkRepository, ConnectionRepository};
use crate::telemetry::trace_middleware;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Arc<DatabaseConnection>,
    pub broker: Arc<BrokerClient>,
    /// Linking token validator supplied by the embedding application;
    /// absent means the linking surface answers 501
    pub linking_validator: Option<Arc<dyn LinkingTokenValidator>>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, db: Arc<DatabaseConnection>) -> Self {
        let broker = Arc::new(BrokerClient::new(
            &config.broker_base_url,
            config.broker_api_key.as_deref().unwrap_or_default(),
        ));

        Self {
            config,
            db,
            broker,
            linking_validator: None,
        }
    }

    /// Installs a linking token validator, enabling the linking surface
    pub fn with_linking_validator(mut self, validator: Arc<dyn LinkingTokenValidator>) -> Self {
        self.linking_validator = Some(validator);
        self
    }

    /// Connection lifecycle service over this state's pool and broker
    pub fn connection_service(&self) -> ConnectionService {
        ConnectionService::new(
            ConnectionRepository::new(Arc::clone(&self.db)),
            Arc::clone(&self.broker),
        )
    }

    /// Account linking service over this state's pool and validator
    pub fn linking_service(&self) -> LinkingService {
        LinkingService::new(
            AccountLinkRepository::new(Arc::clone(&self.db)),
            self.linking_validator.clone(),
        )
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    // Signup and the allow-list listing are reachable without a key; every
    // other agent-facing route goes through bearer auth.
    let protected = Router::new()
        .route("/connect", post(handlers::connect::request_connection))
        .route(
            "/connect/{id}/status",
            get(handlers::connect::connection_status),
        )
        .route(
            "/connect/{id}/refresh",
            post(handlers::connect::refresh_connection),
        )
        .route("/action", post(handlers::actions::execute_action))
        .route("/link", post(handlers::link::link_account))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api = Router::new()
        .route("/signup", post(handlers::signup::signup))
        .route("/apps", get(handlers::apps::list_apps))
        .merge(protected);

    Router::new()
        .route("/", get(handlers::root))
        .nest("/app-access/v1", api)
        .layer(middleware::from_fn(trace_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;
    let profile = config.profile.clone();

    let state = AppState::new(Arc::new(config), Arc::new(db));
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::signup::signup,
        crate::handlers::apps::list_apps,
        crate::handlers::connect::request_connection,
        crate::handlers::connect::connection_status,
        crate::handlers::connect::refresh_connection,
        crate::handlers::actions::execute_action,
        crate::handlers::link::link_account,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::error::BrokerErrorDetails,
            crate::handlers::signup::SignupRequest,
            crate::handlers::signup::SignupResponse,
            crate::handlers::apps::AppInfo,
            crate::handlers::apps::AppsResponse,
            crate::handlers::connect::ConnectRequest,
            crate::handlers::connect::ConnectResponse,
            crate::handlers::connect::ConnectionStatusResponse,
            crate::handlers::actions::ActionRequest,
            crate::handlers::actions::ActionResponse,
            crate::handlers::link::LinkRequest,
            crate::handlers::link::LinkResponse,
        )
    ),
    info(
        title = "App Access API",
        description = "API for agent app access: key issuance, brokered connections, and allow-listed action execution",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
