use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};

use codemall_api::{
    config::AppConfig,
    db,
    entity::{Products, Users, products, users},
    models::Role,
    utils::password::hash_password,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = db::connect(&config.database).await?;
    // Ensure migrations are applied.
    db::migrate(&orm).await?;

    let iterations = config.auth.pbkdf2_iterations;
    let admin_id = ensure_user(&orm, "Admin", "admin@codemall.local", "admin123", Role::Admin, iterations).await?;
    let seller_id = ensure_user(&orm, "Seller", "seller@codemall.local", "seller123", Role::Seller, iterations).await?;
    let buyer_id = ensure_user(&orm, "Buyer", "buyer@codemall.local", "buyer123", Role::Buyer, iterations).await?;
    let created = seed_products(&orm, seller_id).await?;

    println!(
        "Seed completed. Admin ID: {admin_id}, Seller ID: {seller_id}, Buyer ID: {buyer_id}, new products: {created}"
    );
    orm.close().await?;
    Ok(())
}

/// Creates the account, or resets role and password when the email exists.
async fn ensure_user(
    orm: &DatabaseConnection,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
    iterations: u32,
) -> anyhow::Result<i32> {
    let password_hash = hash_password(password, iterations);

    let existing = Users::find()
        .filter(users::Column::Email.eq(email))
        .one(orm)
        .await?;

    let user = match existing {
        Some(user) => {
            let mut active = user.into_active_model();
            active.role = Set(role);
            active.password_hash = Set(Some(password_hash));
            active.update(orm).await?
        }
        None => {
            users::ActiveModel {
                name: Set(name.to_string()),
                email: Set(email.to_string()),
                role: Set(role),
                password_hash: Set(Some(password_hash)),
                banned: Set(false),
                avatar: Set(None),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(orm)
            .await?
        }
    };
    Ok(user.id)
}

async fn seed_products(orm: &DatabaseConnection, seller_id: i32) -> anyhow::Result<u64> {
    let samples = [
        ("Starter Landing Page", "template", "web", 29.0),
        ("Invoice Generator", "script", "automation", 12.5),
        ("Icon Pack Minimal", "asset", "design", 7.9),
        ("Auth Boilerplate", "template", "backend", 39.0),
    ];

    let mut created = 0;
    for (name, kind, category, price) in samples {
        let exists = Products::find()
            .filter(products::Column::Name.eq(name))
            .filter(products::Column::SellerId.eq(seller_id))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        products::ActiveModel {
            name: Set(name.to_string()),
            kind: Set(kind.to_string()),
            category: Set(Some(category.to_string())),
            price: Set(price),
            seller_id: Set(Some(seller_id)),
            approved: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(orm)
        .await?;
        created += 1;
    }
    Ok(created)
}
