use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // One column per ALTER: SQLite rejects multi-column alters.
        if !manager.has_column("products", "category").await? {
            manager
                .alter_table(
                    Table::alter()
                        .table(Products::Table)
                        .add_column(ColumnDef::new(Products::Category).string_len(100).null())
                        .to_owned(),
                )
                .await?;
        }
        if !manager.has_column("products", "seller_id").await? {
            manager
                .alter_table(
                    Table::alter()
                        .table(Products::Table)
                        .add_column(ColumnDef::new(Products::SellerId).integer().null())
                        .to_owned(),
                )
                .await?;
        }
        if !manager.has_column("products", "approved").await? {
            manager
                .alter_table(
                    Table::alter()
                        .table(Products::Table)
                        .add_column(
                            ColumnDef::new(Products::Approved)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .to_owned(),
                )
                .await?;
        }

        if !manager.has_index("products", "idx_products_seller_id").await? {
            manager
                .create_index(
                    Index::create()
                        .name("idx_products_seller_id")
                        .table(Products::Table)
                        .col(Products::SellerId)
                        .to_owned(),
                )
                .await?;
        }
        if !manager.has_index("products", "idx_products_category").await? {
            manager
                .create_index(
                    Index::create()
                        .name("idx_products_category")
                        .table(Products::Table)
                        .col(Products::Category)
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_products_category")
                    .table(Products::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_products_seller_id")
                    .table(Products::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Category,
    SellerId,
    Approved,
}
