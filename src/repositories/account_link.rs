//! Account link repository for database operations
//!
//! One link per API key, last write wins. The reverse lookup by external
//! account id is served by a dedicated index.

use anyhow::{Result, anyhow};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::account_link::{self, Entity as AccountLink};

/// Repository for account link database operations
#[derive(Debug, Clone)]
pub struct AccountLinkRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl AccountLinkRepository {
    /// Creates a new AccountLinkRepository instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Upserts the link for an API key (replace-on-exists, never a duplicate)
    pub async fn upsert(
        &self,
        api_key_id: &Uuid,
        external_account_id: &str,
    ) -> Result<account_link::Model> {
        let now = chrono::Utc::now();

        if let Some(existing) = self.find_by_key(api_key_id).await? {
            let mut model: account_link::ActiveModel = existing.into();
            model.external_account_id = Set(external_account_id.to_string());
            model.linked_at = Set(now.into());
            return Ok(model.update(&*self.db).await?);
        }

        let id = Uuid::new_v4();
        let active = account_link::ActiveModel {
            id: Set(id),
            api_key_id: Set(*api_key_id),
            external_account_id: Set(external_account_id.to_string()),
            linked_at: Set(now.into()),
        };
        active.insert(&*self.db).await?;

        // For SQLite, query the record directly since we already know the ID
        let fetched = AccountLink::find_by_id(id).one(&*self.db).await?;
        fetched.ok_or_else(|| anyhow!("account link not persisted"))
    }

    /// Retrieves the link for an API key, if one exists
    pub async fn find_by_key(&self, api_key_id: &Uuid) -> Result<Option<account_link::Model>> {
        Ok(AccountLink::find()
            .filter(account_link::Column::ApiKeyId.eq(*api_key_id))
            .one(&*self.db)
            .await?)
    }

    /// Reverse lookup: all keys linked to an external account
    pub async fn find_by_account(
        &self,
        external_account_id: &str,
    ) -> Result<Vec<account_link::Model>> {
        Ok(AccountLink::find()
            .filter(account_link::Column::ExternalAccountId.eq(external_account_id))
            .order_by_asc(account_link::Column::LinkedAt)
            .order_by_asc(account_link::Column::Id)
            .all(&*self.db)
            .await?)
    }

    /// Deletes the link for an API key; no-op (not an error) if absent
    pub async fn delete_by_key(&self, api_key_id: &Uuid) -> Result<()> {
        AccountLink::delete_many()
            .filter(account_link::Column::ApiKeyId.eq(*api_key_id))
            .exec(&*self.db)
            .await?;

        Ok(())
    }
}
