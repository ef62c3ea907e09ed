//! # Data Models
//!
//! This module contains the SeaORM entity models used throughout the
//! App Access API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod account_link;
pub mod api_key;
pub mod connection;
pub mod scope_override;

pub use account_link::Entity as AccountLink;
pub use api_key::Entity as ApiKey;
pub use connection::Entity as Connection;
pub use scope_override::Entity as ScopeOverride;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "app-access".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
