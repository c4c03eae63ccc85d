use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if manager.has_column("product_images", "stored_name").await? {
            return Ok(());
        }
        manager
            .alter_table(
                Table::alter()
                    .table(ProductImages::Table)
                    .add_column(ColumnDef::new(ProductImages::StoredName).string_len(64).null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(ProductImages::Table)
                    .drop_column(ProductImages::StoredName)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum ProductImages {
    Table,
    StoredName,
}
