use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TenantDbConfigs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TenantDbConfigs::TenantId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TenantDbConfigs::Ciphertext).text().not_null())
                    .col(
                        ColumnDef::new(TenantDbConfigs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TenantDbConfigs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TenantDbConfigs {
    Table,
    TenantId,
    Ciphertext,
    UpdatedAt,
}
