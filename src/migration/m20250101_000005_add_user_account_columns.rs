use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 191 chars keeps the unique index within utf8mb4 key limits.
        let columns = [
            (
                "email",
                ColumnDef::new(Users::Email).string_len(191).null().to_owned(),
            ),
            (
                "password_hash",
                ColumnDef::new(Users::PasswordHash).string().null().to_owned(),
            ),
            (
                "banned",
                ColumnDef::new(Users::Banned)
                    .boolean()
                    .not_null()
                    .default(false)
                    .to_owned(),
            ),
            (
                "avatar",
                ColumnDef::new(Users::Avatar).string_len(512).null().to_owned(),
            ),
        ];

        for (name, column) in columns {
            if manager.has_column("users", name).await? {
                continue;
            }
            manager
                .alter_table(
                    Table::alter()
                        .table(Users::Table)
                        .add_column(column)
                        .to_owned(),
                )
                .await?;
        }

        if !manager.has_index("users", "uk_users_email").await? {
            manager
                .create_index(
                    Index::create()
                        .name("uk_users_email")
                        .table(Users::Table)
                        .col(Users::Email)
                        .unique()
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
                    .name("uk_users_email")
                    .table(Users::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Email,
    PasswordHash,
    Banned,
    Avatar,
}
