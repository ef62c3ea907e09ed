//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM
//! operations for database entities, providing a clean API for data access.

pub mod account_link;
pub mod api_key;
pub mod connection;
pub mod scope_override;

pub use account_link::AccountLinkRepository;
pub use api_key::ApiKeyRepository;
pub use connection::ConnectionRepository;
pub use scope_override::ScopeOverrideRepository;
