//! API key repository for database operations
//!
//! Issues new agent keys (returning the plaintext exactly once) and resolves
//! digests back to key records for request authentication.

use anyhow::{Result, anyhow};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::keys::{generate_api_key, hash_api_key};
use crate::models::api_key::{self, Entity as ApiKey};

/// Repository for API key database operations
#[derive(Debug, Clone)]
pub struct ApiKeyRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl ApiKeyRepository {
    /// Creates a new ApiKeyRepository instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Issues a new API key for an agent.
    ///
    /// Generates fresh key material, persists only its digest, and returns
    /// the plaintext alongside the stored record. The plaintext is not
    /// retrievable after this call.
    pub async fn issue(&self, agent_name: &str) -> Result<(String, api_key::Model)> {
        let plaintext = generate_api_key();
        let id = Uuid::new_v4();
        let now = chrono::Utc::now();

        let active = api_key::ActiveModel {
            id: Set(id),
            agent_name: Set(agent_name.to_string()),
            api_key_hash: Set(hash_api_key(&plaintext)),
            status: Set(api_key::status::ACTIVE.to_string()),
            created_at: Set(now.into()),
        };
        active.insert(&*self.db).await?;

        // For SQLite, query the record directly since we already know the ID
        let fetched = ApiKey::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| anyhow!("api key not persisted"))?;

        Ok((plaintext, fetched))
    }

    /// Resolves a key digest to its record, if one exists.
    ///
    /// Status is not filtered here; the authenticator decides how to treat
    /// revoked keys.
    pub async fn find_by_hash(&self, api_key_hash: &str) -> Result<Option<api_key::Model>> {
        Ok(ApiKey::find()
            .filter(api_key::Column::ApiKeyHash.eq(api_key_hash))
            .one(&*self.db)
            .await?)
    }

    /// Flips a key's status to revoked (owner-facing management surface)
    pub async fn revoke(&self, id: &Uuid) -> Result<api_key::Model> {
        let existing = ApiKey::find_by_id(*id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| anyhow!("API key '{}' not found", id))?;

        let mut model: api_key::ActiveModel = existing.into();
        model.status = Set(api_key::status::REVOKED.to_string());

        Ok(model.update(&*self.db).await?)
    }
}
