//! Scope override repository for database operations
//!
//! Upsert-by-unique-triple semantics: at most one override exists per
//! (api_key_id, app, action), and setting an existing triple replaces its
//! `allowed` flag rather than inserting a second row.

use anyhow::{Result, anyhow};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::scope_override::{self, Entity as ScopeOverride};

/// Repository for scope override database operations
#[derive(Debug, Clone)]
pub struct ScopeOverrideRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl ScopeOverrideRepository {
    /// Creates a new ScopeOverrideRepository instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Upserts the override for an (api_key_id, app, action) triple
    pub async fn set(
        &self,
        api_key_id: &Uuid,
        app: &str,
        action: &str,
        allowed: bool,
    ) -> Result<scope_override::Model> {
        let now = chrono::Utc::now();

        if let Some(existing) = self.get(api_key_id, app, action).await? {
            let mut model: scope_override::ActiveModel = existing.into();
            model.allowed = Set(allowed);
            model.updated_at = Set(now.into());
            return Ok(model.update(&*self.db).await?);
        }

        let id = Uuid::new_v4();
        let active = scope_override::ActiveModel {
            id: Set(id),
            api_key_id: Set(*api_key_id),
            app: Set(app.to_string()),
            action: Set(action.to_string()),
            allowed: Set(allowed),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        active.insert(&*self.db).await?;

        // For SQLite, query the record directly since we already know the ID
        let fetched = ScopeOverride::find_by_id(id).one(&*self.db).await?;
        fetched.ok_or_else(|| anyhow!("scope override not persisted"))
    }

    /// Retrieves the override for a triple, if one exists
    pub async fn get(
        &self,
        api_key_id: &Uuid,
        app: &str,
        action: &str,
    ) -> Result<Option<scope_override::Model>> {
        Ok(ScopeOverride::find()
            .filter(scope_override::Column::ApiKeyId.eq(*api_key_id))
            .filter(scope_override::Column::App.eq(app))
            .filter(scope_override::Column::Action.eq(action))
            .one(&*self.db)
            .await?)
    }

    /// Lists all overrides for an (api_key_id, app) pair ordered by action
    pub async fn list(&self, api_key_id: &Uuid, app: &str) -> Result<Vec<scope_override::Model>> {
        Ok(ScopeOverride::find()
            .filter(scope_override::Column::ApiKeyId.eq(*api_key_id))
            .filter(scope_override::Column::App.eq(app))
            .order_by_asc(scope_override::Column::Action)
            .all(&*self.db)
            .await?)
    }

    /// Removes the override for a triple; no-op if absent
    pub async fn remove(&self, api_key_id: &Uuid, app: &str, action: &str) -> Result<()> {
        ScopeOverride::delete_many()
            .filter(scope_override::Column::ApiKeyId.eq(*api_key_id))
            .filter(scope_override::Column::App.eq(app))
            .filter(scope_override::Column::Action.eq(action))
            .exec(&*self.db)
            .await?;

        Ok(())
    }
}
