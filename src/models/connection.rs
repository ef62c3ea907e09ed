//! Connection entity model
//!
//! Tracks the lifecycle of one broker-side authorization between an API key
//! and one supported application. The broker connection id is absent until
//! the broker has answered the initiate call; the entity id is derived from
//! the owning key and stays stable across re-initiations.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

/// Internal connection status vocabulary.
///
/// `initiated → {active, expired, failed}` by reconciliation against the
/// broker; terminal states go back to `initiated` only via explicit refresh.
pub mod status {
    pub const INITIATED: &str = "initiated";
    pub const ACTIVE: &str = "active";
    pub const EXPIRED: &str = "expired";
    pub const FAILED: &str = "failed";
}

/// Connection entity representing one brokered authorization
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "connections")]
pub struct Model {
    /// Unique identifier for the connection (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning API key
    pub api_key_id: Uuid,

    /// Application name (allow-list vocabulary, e.g. "gmail")
    pub app: String,

    /// Broker-assigned connection id, absent until the broker responds
    pub broker_connection_id: Option<String>,

    /// Broker-side entity identity, derived from the owning key id
    pub broker_entity_id: Option<String>,

    /// Lifecycle status (initiated|active|expired|failed)
    pub status: String,

    /// Timestamp when the connection was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the connection was last updated
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
