//! API key entity model
//!
//! Identity of an agent. Stores the one-way digest of the issued key and a
//! status flag; the plaintext key is never persisted.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

/// Status values for an API key.
pub mod status {
    pub const ACTIVE: &str = "active";
    pub const REVOKED: &str = "revoked";
}

/// API key entity representing one issued agent credential
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "api_keys")]
pub struct Model {
    /// Unique identifier for the key (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Human-readable name of the agent the key was issued to
    pub agent_name: String,

    /// SHA-256 hex digest of the plaintext key (unique)
    pub api_key_hash: String,

    /// Status of the key (active|revoked)
    pub status: String,

    /// Timestamp when the key was issued
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::connection::Entity")]
    Connection,
}

impl Related<super::connection::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Connection.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
