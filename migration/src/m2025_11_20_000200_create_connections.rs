//! Migration to create the connections table.
//!
//! Connections track the lifecycle of one broker-side authorization between
//! an API key and one supported application.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Connections::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Connections::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Connections::ApiKeyId).uuid().not_null())
                    .col(ColumnDef::new(Connections::App).text().not_null())
                    .col(
                        ColumnDef::new(Connections::BrokerConnectionId)
                            .text()
                            .null(),
                    )
                    .col(ColumnDef::new(Connections::BrokerEntityId).text().null())
                    .col(
                        ColumnDef::new(Connections::Status)
                            .text()
                            .not_null()
                            .default("initiated"),
                    )
                    .col(
                        ColumnDef::new(Connections::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Connections::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_connections_api_key_id")
                            .from(Connections::Table, Connections::ApiKeyId)
                            .to(ApiKeys::Table, ApiKeys::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Non-unique on purpose: the check-then-insert path in the lifecycle
        // manager does not guarantee a single active connection per
        // (api_key_id, app); see the lifecycle test suite.
        manager
            .create_index(
                Index::create()
                    .name("idx_connections_api_key_app")
                    .table(Connections::Table)
                    .col(Connections::ApiKeyId)
                    .col(Connections::App)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_connections_api_key_app")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Connections::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Connections {
    Table,
    Id,
    ApiKeyId,
    App,
    BrokerConnectionId,
    BrokerEntityId,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ApiKeys {
    Table,
    Id,
}
