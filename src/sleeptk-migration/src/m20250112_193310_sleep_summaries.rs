use sea_orm_migration::prelude::*;

use crate::m20250105_081230_sessions::Sessions;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SleepSummaries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SleepSummaries::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SleepSummaries::SessionId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(SleepSummaries::SleepId).date().not_null())
                    .col(ColumnDef::new(SleepSummaries::Start).date_time().not_null())
                    .col(ColumnDef::new(SleepSummaries::End).date_time().not_null())
                    .col(ColumnDef::new(SleepSummaries::MinBpm).small_integer().null())
                    .col(ColumnDef::new(SleepSummaries::MaxBpm).small_integer().null())
                    .col(ColumnDef::new(SleepSummaries::AvgBpm).small_integer().null())
                    .col(ColumnDef::new(SleepSummaries::MeanMotion).double().not_null())
                    .col(ColumnDef::new(SleepSummaries::Cycles).double().not_null())
                    .col(ColumnDef::new(SleepSummaries::Touches).integer().not_null())
                    .col(ColumnDef::new(SleepSummaries::Score).double().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sleep_summaries_session")
                            .from(SleepSummaries::Table, SleepSummaries::SessionId)
                            .to(Sessions::Table, Sessions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SleepSummaries::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SleepSummaries {
    Table,
    Id,
    SessionId,
    SleepId,
    Start,
    End,
    MinBpm,
    MaxBpm,
    AvgBpm,
    MeanMotion,
    Cycles,
    Touches,
    Score,
}
