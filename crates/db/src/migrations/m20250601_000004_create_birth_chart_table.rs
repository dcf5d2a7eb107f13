//! Create birth_chart table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BirthChart::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BirthChart::UserId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BirthChart::Sun).string().null())
                    .col(ColumnDef::new(BirthChart::Moon).string().null())
                    .col(ColumnDef::new(BirthChart::Rising).string().null())
                    .col(
                        ColumnDef::new(BirthChart::ComputedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BirthChart::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
enum BirthChart {
    Table,
    UserId,
    Sun,
    Moon,
    Rising,
    ComputedAt,
}
