//! Connection repository for database operations
//!
//! This module provides the ConnectionRepository struct which encapsulates
//! SeaORM operations for the connections table. Ownership filtering stays in
//! the lifecycle layer so missing and foreign-owned rows produce the same
//! caller-visible outcome.

use anyhow::{Result, anyhow};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::connection::{self, Entity as Connection, status};

/// Repository for connection database operations
#[derive(Debug, Clone)]
pub struct ConnectionRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl ConnectionRepository {
    /// Creates a new ConnectionRepository instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates a new connection record in status `initiated`
    pub async fn create(
        &self,
        api_key_id: &Uuid,
        app: &str,
        broker_connection_id: Option<&str>,
        broker_entity_id: Option<&str>,
    ) -> Result<connection::Model> {
        let id = Uuid::new_v4();
        let now = chrono::Utc::now();

        let active = connection::ActiveModel {
            id: Set(id),
            api_key_id: Set(*api_key_id),
            app: Set(app.to_string()),
            broker_connection_id: Set(broker_connection_id.map(str::to_string)),
            broker_entity_id: Set(broker_entity_id.map(str::to_string)),
            status: Set(status::INITIATED.to_string()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        active.insert(&*self.db).await?;

        // For SQLite, query the record directly since we already know the ID
        let fetched = Connection::find_by_id(id).one(&*self.db).await?;
        fetched.ok_or_else(|| anyhow!("connection not persisted"))
    }

    /// Retrieves a connection by its ID
    pub async fn find_by_id(&self, id: &Uuid) -> Result<Option<connection::Model>> {
        Ok(Connection::find_by_id(*id).one(&*self.db).await?)
    }

    /// Finds any active connection for an (api_key_id, app) pair.
    ///
    /// `one()` semantics are "any one matching row": the check-then-insert
    /// path in the lifecycle manager does not guarantee uniqueness.
    pub async fn find_active_by_key_and_app(
        &self,
        api_key_id: &Uuid,
        app: &str,
    ) -> Result<Option<connection::Model>> {
        Ok(Connection::find()
            .filter(connection::Column::ApiKeyId.eq(*api_key_id))
            .filter(connection::Column::App.eq(app))
            .filter(connection::Column::Status.eq(status::ACTIVE))
            .one(&*self.db)
            .await?)
    }

    /// Lists all connections for an (api_key_id, app) pair ordered by creation time
    pub async fn find_by_key_and_app(
        &self,
        api_key_id: &Uuid,
        app: &str,
    ) -> Result<Vec<connection::Model>> {
        Ok(Connection::find()
            .filter(connection::Column::ApiKeyId.eq(*api_key_id))
            .filter(connection::Column::App.eq(app))
            .order_by_asc(connection::Column::CreatedAt)
            .order_by_asc(connection::Column::Id)
            .all(&*self.db)
            .await?)
    }

    /// Patch helper for status reconciliation and refresh.
    ///
    /// Mutates the existing row in place (the connection id never changes);
    /// the broker connection id is only overwritten when provided.
    pub async fn update_status(
        &self,
        id: &Uuid,
        new_status: &str,
        broker_connection_id: Option<&str>,
    ) -> Result<connection::Model> {
        let existing = Connection::find_by_id(*id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| anyhow!("Connection '{}' not found", id))?;

        let mut model: connection::ActiveModel = existing.into();
        model.status = Set(new_status.to_string());
        model.updated_at = Set(chrono::Utc::now().into());
        if let Some(broker_id) = broker_connection_id {
            model.broker_connection_id = Set(Some(broker_id.to_string()));
        }

        Ok(model.update(&*self.db).await?)
    }
}
