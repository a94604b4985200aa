use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Sessions::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Sessions::Start)
                            .date_time()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Sessions::Frequency).integer().not_null())
                    // 0 for legacy logs, which carry no version in their name
                    .col(ColumnDef::new(Sessions::Version).integer().not_null())
                    .col(ColumnDef::new(Sessions::FileName).text().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Sessions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Sessions {
    Table,
    Id,
    Start,
    Frequency,
    Version,
    FileName,
}
