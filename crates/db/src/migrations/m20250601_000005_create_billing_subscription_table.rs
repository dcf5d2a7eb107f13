//! Create billing_subscription table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BillingSubscription::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BillingSubscription::UserId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BillingSubscription::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(BillingSubscription::Plan).string().null())
                    .col(
                        ColumnDef::new(BillingSubscription::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BillingSubscription::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
enum BillingSubscription {
    Table,
    UserId,
    Status,
    Plan,
    UpdatedAt,
}
