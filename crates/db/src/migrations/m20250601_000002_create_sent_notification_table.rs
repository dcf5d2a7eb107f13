//! Create sent_notification table, the daily dedup ledger.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SentNotification::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(SentNotification::Day).date().not_null())
                    .col(
                        ColumnDef::new(SentNotification::EventKey)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SentNotification::EventType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SentNotification::EventName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SentNotification::Priority)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SentNotification::SentBy).string().not_null())
                    .col(
                        ColumnDef::new(SentNotification::SentAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    // The composite key is the dedup gate: a conflicting
                    // insert means the event was already claimed today.
                    .primary_key(
                        Index::create()
                            .col(SentNotification::Day)
                            .col(SentNotification::EventKey),
                    )
                    .to_owned(),
            )
            .await?;

        // Index on day for retention cleanup
        manager
            .create_index(
                Index::create()
                    .name("idx_sent_notification_day")
                    .table(SentNotification::Table)
                    .col(SentNotification::Day)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SentNotification::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
enum SentNotification {
    Table,
    Day,
    EventKey,
    EventType,
    EventName,
    Priority,
    SentBy,
    SentAt,
}
