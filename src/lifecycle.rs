//! Connection lifecycle manager
//!
//! Drives the per-(key, app) connection state machine: request a new
//! brokered connection, reconcile local status against the broker on read,
//! and re-initiate expired or failed connections in place. Ownership checks
//! live here; a connection owned by a different key is reported exactly like
//! a missing one.

use std::sync::Arc;
use uuid::Uuid;

use crate::broker::{BrokerClient, map_broker_status};
use crate::error::{ApiError, no_active_connection, not_found, unsupported_app};
use crate::models::connection::{self, status};
use crate::repositories::ConnectionRepository;

/// Derives the stable broker-side entity identity for an API key.
///
/// The same entity id is reused for every connection and refresh under the
/// key so the broker sees one principal per agent.
pub fn entity_id_for(api_key_id: &Uuid) -> String {
    format!("rl_{}", api_key_id)
}

/// Outcome of a connection request
#[derive(Debug, Clone)]
pub enum ConnectionOutcome {
    /// An active connection already exists; no broker call was made
    Existing(connection::Model),
    /// A new connection was initiated with the broker
    Initiated {
        connection: connection::Model,
        auth_url: String,
    },
}

/// Service coordinating connection records with the broker
#[derive(Clone)]
pub struct ConnectionService {
    connections: ConnectionRepository,
    broker: Arc<BrokerClient>,
}

impl ConnectionService {
    pub fn new(connections: ConnectionRepository, broker: Arc<BrokerClient>) -> Self {
        Self {
            connections,
            broker,
        }
    }

    /// Requests a connection to an app for an API key.
    ///
    /// Idempotent over active connections: if one already exists for the
    /// (key, app) pair it is returned as-is. Otherwise a fresh record is
    /// created in `initiated` with the broker's connection id and the
    /// authorization URL for the caller to complete.
    ///
    /// Check-then-insert: two racing requests for the same pair can both
    /// pass the active check and create two rows. Accepted; the reads all
    /// use "any matching row" semantics.
    pub async fn request_connection(
        &self,
        api_key_id: &Uuid,
        app: &str,
    ) -> Result<ConnectionOutcome, ApiError> {
        if !crate::allowlist::is_app_supported(app) {
            return Err(unsupported_app(app));
        }

        if let Some(existing) = self
            .connections
            .find_active_by_key_and_app(api_key_id, app)
            .await?
        {
            tracing::debug!(
                connection_id = %existing.id,
                app = %app,
                "Reusing existing active connection"
            );
            return Ok(ConnectionOutcome::Existing(existing));
        }

        let entity_id = entity_id_for(api_key_id);
        let initiated = self.broker.initiate(&entity_id, app).await?;

        let record = self
            .connections
            .create(
                api_key_id,
                app,
                Some(&initiated.connection_id),
                Some(&entity_id),
            )
            .await?;

        tracing::info!(
            connection_id = %record.id,
            broker_connection_id = %initiated.connection_id,
            app = %app,
            "Initiated new connection"
        );

        Ok(ConnectionOutcome::Initiated {
            connection: record,
            auth_url: initiated.auth_url,
        })
    }

    /// Returns the current status of a connection, reconciling against the
    /// broker when the local record is still `initiated`.
    ///
    /// Terminal local statuses (`active`, `expired`, `failed`) are served
    /// from the database without a broker round-trip; once the broker
    /// reports a terminal status it is persisted so later reads stay local.
    pub async fn get_status(
        &self,
        api_key_id: &Uuid,
        connection_id: &Uuid,
    ) -> Result<connection::Model, ApiError> {
        let record = self.find_owned(api_key_id, connection_id).await?;

        if record.status != status::INITIATED {
            return Ok(record);
        }

        let broker_id = match record.broker_connection_id.as_deref() {
            Some(id) => id,
            // No broker id means the initiate call never completed; nothing
            // to reconcile against.
            None => return Ok(record),
        };

        let raw = self.broker.poll_status(broker_id).await?;
        let mapped = map_broker_status(&raw);

        if mapped == record.status {
            return Ok(record);
        }

        // Only persist statuses from the internal vocabulary; an unknown
        // broker status leaves the record untouched.
        match mapped.as_str() {
            status::ACTIVE | status::EXPIRED | status::FAILED => {
                tracing::info!(
                    connection_id = %record.id,
                    from = %record.status,
                    to = %mapped,
                    "Connection status reconciled from broker"
                );
                Ok(self
                    .connections
                    .update_status(connection_id, &mapped, None)
                    .await?)
            }
            _ => {
                tracing::warn!(
                    connection_id = %record.id,
                    broker_status = %raw,
                    "Unrecognized broker status; keeping local record"
                );
                Ok(record)
            }
        }
    }

    /// Re-initiates a connection in place, whatever its current status.
    ///
    /// The local row keeps its id; the broker connection id is replaced and
    /// the status reset to `initiated`. The original entity id is reused so
    /// the broker-side principal is unchanged. This is the only path from a
    /// terminal status back to `initiated`.
    pub async fn refresh(
        &self,
        api_key_id: &Uuid,
        connection_id: &Uuid,
    ) -> Result<(connection::Model, String), ApiError> {
        let record = self.find_owned(api_key_id, connection_id).await?;

        let entity_id = record
            .broker_entity_id
            .clone()
            .unwrap_or_else(|| entity_id_for(api_key_id));

        let initiated = self.broker.initiate(&entity_id, &record.app).await?;

        let updated = self
            .connections
            .update_status(
                connection_id,
                status::INITIATED,
                Some(&initiated.connection_id),
            )
            .await?;

        tracing::info!(
            connection_id = %updated.id,
            broker_connection_id = %initiated.connection_id,
            app = %updated.app,
            "Connection re-initiated"
        );

        Ok((updated, initiated.auth_url))
    }

    /// Resolves the active connection required for executing an action
    pub async fn require_active(
        &self,
        api_key_id: &Uuid,
        app: &str,
    ) -> Result<connection::Model, ApiError> {
        self.connections
            .find_active_by_key_and_app(api_key_id, app)
            .await?
            .ok_or_else(|| no_active_connection(app))
    }

    /// Loads a connection and enforces ownership.
    ///
    /// Missing and foreign-owned rows are indistinguishable to the caller.
    async fn find_owned(
        &self,
        api_key_id: &Uuid,
        connection_id: &Uuid,
    ) -> Result<connection::Model, ApiError> {
        self.connections
            .find_by_id(connection_id)
            .await?
            .filter(|record| record.api_key_id == *api_key_id)
            .ok_or_else(|| not_found("Connection not found"))
    }
}
