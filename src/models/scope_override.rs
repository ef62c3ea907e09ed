//! Scope override entity model
//!
//! Per-(api key, app, action) allow/deny decision set by the account owner.
//! An explicit deny always wins over the static allow-list; an override can
//! never permit an action the allow-list does not contain.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

/// Scope override entity, unique per (api_key_id, app, action)
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "scope_overrides")]
pub struct Model {
    /// Unique identifier for the override (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// API key the override applies to
    pub api_key_id: Uuid,

    /// Application name
    pub app: String,

    /// Action identifier within the app's allow-list vocabulary
    pub action: String,

    /// Whether the action is permitted for this key
    pub allowed: bool,

    /// Timestamp when the override was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the override was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::api_key::Entity",
        from = "Column::ApiKeyId",
        to = "super::api_key::Column::Id"
    )]
    ApiKey,
}

impl Related<super::api_key::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApiKey.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
