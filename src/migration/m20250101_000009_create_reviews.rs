use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reviews::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reviews::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Reviews::TargetType).string_len(20).not_null())
                    .col(ColumnDef::new(Reviews::TargetId).integer().not_null())
                    .col(ColumnDef::new(Reviews::BuyerId).integer().not_null())
                    .col(ColumnDef::new(Reviews::Rating).integer().not_null())
                    .col(ColumnDef::new(Reviews::Comment).text().null())
                    .col(ColumnDef::new(Reviews::ReplySellerId).integer().null())
                    .col(ColumnDef::new(Reviews::ReplyMessage).text().null())
                    .col(ColumnDef::new(Reviews::RepliedAt).timestamp_with_time_zone().null())
                    .col(
                        ColumnDef::new(Reviews::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        if !manager.has_index("reviews", "idx_reviews_target").await? {
            manager
                .create_index(
                    Index::create()
                        .name("idx_reviews_target")
                        .table(Reviews::Table)
                        .col(Reviews::TargetType)
                        .col(Reviews::TargetId)
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reviews::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Reviews {
    Table,
    Id,
    TargetType,
    TargetId,
    BuyerId,
    Rating,
    Comment,
    ReplySellerId,
    ReplyMessage,
    RepliedAt,
    CreatedAt,
}
