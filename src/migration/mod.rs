//! Forward-only schema migrations, tracked in the `seaql_migrations` table.
//!
//! Every migration is safe to run against a database that was created by an
//! older ad hoc bootstrap: tables are created with `IF NOT EXISTS` and
//! additive changes probe for the column or index before touching it, and
//! legacy column types are converted only when found.

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_products;
mod m20250101_000002_add_product_catalog_columns;
mod m20250101_000003_create_product_images;
mod m20250101_000004_create_users;
mod m20250101_000005_add_user_account_columns;
mod m20250101_000006_create_favorites;
mod m20250101_000007_create_cart_items;
mod m20250101_000008_create_orders;
mod m20250101_000009_create_reviews;
mod m20250101_000010_create_notifications;
mod m20250101_000011_create_audit_logs;
mod m20250101_000012_widen_product_price;
mod m20250101_000013_add_product_image_stored_name;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_products::Migration),
            Box::new(m20250101_000002_add_product_catalog_columns::Migration),
            Box::new(m20250101_000003_create_product_images::Migration),
            Box::new(m20250101_000004_create_users::Migration),
            Box::new(m20250101_000005_add_user_account_columns::Migration),
            Box::new(m20250101_000006_create_favorites::Migration),
            Box::new(m20250101_000007_create_cart_items::Migration),
            Box::new(m20250101_000008_create_orders::Migration),
            Box::new(m20250101_000009_create_reviews::Migration),
            Box::new(m20250101_000010_create_notifications::Migration),
            Box::new(m20250101_000011_create_audit_logs::Migration),
            Box::new(m20250101_000012_widen_product_price::Migration),
            Box::new(m20250101_000013_add_product_image_stored_name::Migration),
        ]
    }
}
