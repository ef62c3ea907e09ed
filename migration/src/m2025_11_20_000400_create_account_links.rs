//! Migration to create the account_links table.
//!
//! Account links map an API key to one externally-defined account id.
//! The unique index on api_key_id gives the 1:1 last-write-wins semantics,
//! and the external_account_id index supports the reverse lookup.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AccountLinks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccountLinks::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AccountLinks::ApiKeyId).uuid().not_null())
                    .col(
                        ColumnDef::new(AccountLinks::ExternalAccountId)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccountLinks::LinkedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_links_api_key_id")
                            .from(AccountLinks::Table, AccountLinks::ApiKeyId)
                            .to(ApiKeys::Table, ApiKeys::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_account_links_api_key_id")
                    .table(AccountLinks::Table)
                    .col(AccountLinks::ApiKeyId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_account_links_external_account_id")
                    .table(AccountLinks::Table)
                    .col(AccountLinks::ExternalAccountId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_account_links_external_account_id")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_account_links_api_key_id")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(AccountLinks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AccountLinks {
    Table,
    Id,
    ApiKeyId,
    ExternalAccountId,
    LinkedAt,
}

#[derive(DeriveIden)]
enum ApiKeys {
    Table,
    Id,
}
