//! Migration to create the scope_overrides table.
//!
//! Scope overrides let an account owner deny an otherwise allow-listed
//! action for a specific agent key. At most one row per
//! (api_key_id, app, action) triple, enforced by a unique index.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ScopeOverrides::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScopeOverrides::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ScopeOverrides::ApiKeyId).uuid().not_null())
                    .col(ColumnDef::new(ScopeOverrides::App).text().not_null())
                    .col(ColumnDef::new(ScopeOverrides::Action).text().not_null())
                    .col(ColumnDef::new(ScopeOverrides::Allowed).boolean().not_null())
                    .col(
                        ColumnDef::new(ScopeOverrides::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ScopeOverrides::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_scope_overrides_api_key_id")
                            .from(ScopeOverrides::Table, ScopeOverrides::ApiKeyId)
                            .to(ApiKeys::Table, ApiKeys::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_scope_overrides_key_app_action")
                    .table(ScopeOverrides::Table)
                    .col(ScopeOverrides::ApiKeyId)
                    .col(ScopeOverrides::App)
                    .col(ScopeOverrides::Action)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_scope_overrides_key_app_action")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(ScopeOverrides::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ScopeOverrides {
    Table,
    Id,
    ApiKeyId,
    App,
    Action,
    Allowed,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ApiKeys {
    Table,
    Id,
}
