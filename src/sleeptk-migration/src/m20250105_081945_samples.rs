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
                    .table(Samples::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Samples::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Samples::SessionId).uuid().not_null())
                    .col(ColumnDef::new(Samples::Time).date_time().not_null())
                    .col(ColumnDef::new(Samples::OffsetSecs).big_integer().not_null())
                    .col(ColumnDef::new(Samples::Motion).double().not_null())
                    // Sqlite and sea orm doesn't have `u8`
                    .col(ColumnDef::new(Samples::Bpm).small_integer().null())
                    .col(
                        ColumnDef::new(Samples::BpmFailed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Samples::Meta)
                            .small_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Samples::Accel).json().null())
                    .col(ColumnDef::new(Samples::BatteryMv).integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_samples_session")
                            .from(Samples::Table, Samples::SessionId)
                            .to(Sessions::Table, Sessions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_samples_session_time")
                    .table(Samples::Table)
                    .col(Samples::SessionId)
                    .col(Samples::Time)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Samples::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Samples {
    Table,
    Id,
    SessionId,
    Time,
    OffsetSecs,
    Motion,
    Bpm,
    BpmFailed,
    Meta,
    Accel,
    BatteryMv,
}
