use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Favorites::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Favorites::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Favorites::BuyerId).integer().not_null())
                    .col(ColumnDef::new(Favorites::TargetType).string_len(20).not_null())
                    .col(ColumnDef::new(Favorites::TargetId).integer().not_null())
                    .col(
                        ColumnDef::new(Favorites::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        if !manager.has_index("favorites", "uk_favorites_target").await? {
            manager
                .create_index(
                    Index::create()
                        .name("uk_favorites_target")
                        .table(Favorites::Table)
                        .col(Favorites::BuyerId)
                        .col(Favorites::TargetType)
                        .col(Favorites::TargetId)
                        .unique()
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Favorites::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Favorites {
    Table,
    Id,
    BuyerId,
    TargetType,
    TargetId,
    CreatedAt,
}
