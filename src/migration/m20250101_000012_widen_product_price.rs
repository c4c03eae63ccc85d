use sea_orm_migration::{
    prelude::*,
    sea_orm::{ConnectionTrait, DatabaseBackend, Statement},
};

/// Databases created by the legacy bootstrap store `products.price` as
/// `DECIMAL(10,2)`, which does not decode into `f64`. Those are widened to `DOUBLE`.
#[derive(DeriveMigrationName)]
pub struct Migration;

const PRICE_TYPE_QUERY: &str = "SELECT CAST(DATA_TYPE AS CHAR) AS data_type \
    FROM information_schema.COLUMNS \
    WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = 'products' AND COLUMN_NAME = 'price'";

fn needs_widening(data_type: &str) -> bool {
    data_type.trim().eq_ignore_ascii_case("decimal")
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if manager.get_database_backend() != DatabaseBackend::MySql {
            return Ok(());
        }

        let row = manager
            .get_connection()
            .query_one(Statement::from_string(DatabaseBackend::MySql, PRICE_TYPE_QUERY))
            .await?;
        let Some(row) = row else {
            return Ok(());
        };
        let data_type: String = row.try_get("", "data_type")?;
        if !needs_widening(&data_type) {
            return Ok(());
        }

        manager
            .alter_table(
                Table::alter()
                    .table(Products::Table)
                    .modify_column(
                        ColumnDef::new(Products::Price)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Price,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_decimal_prices_are_widened() {
        assert!(needs_widening("decimal"));
        assert!(needs_widening("DECIMAL"));
        assert!(!needs_widening("double"));
        assert!(!needs_widening("float"));
    }
}
