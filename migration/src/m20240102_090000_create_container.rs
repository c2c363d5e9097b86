use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Container::Table)
                    .col(
                        ColumnDef::new(Container::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Container::Indicator).string().not_null())
                    .col(ColumnDef::new(Container::ContainerType).string())
                    .col(
                        ColumnDef::new(Container::CreateTime)
                            .date_time()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Container::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden, Clone, Copy)]
pub enum Container {
    Table,
    Id,
    Indicator,
    ContainerType,
    CreateTime,
    MediaFormatId,
    MediaDensityId,
    MediaLabelTranscription,
    MediaManufacturer,
    MediaSerialNumber,
}
