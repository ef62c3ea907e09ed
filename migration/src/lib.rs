//! Database migrations for the App Access API.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_11_20_000100_create_api_keys;
mod m2025_11_20_000200_create_connections;
mod m2025_11_20_000300_create_scope_overrides;
mod m2025_11_20_000400_create_account_links;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_11_20_000100_create_api_keys::Migration),
            Box::new(m2025_11_20_000200_create_connections::Migration),
            Box::new(m2025_11_20_000300_create_scope_overrides::Migration),
            Box::new(m2025_11_20_000400_create_account_links::Migration),
        ]
    }
}
