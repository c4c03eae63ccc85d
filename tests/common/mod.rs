#![allow(dead_code)]

use std::time::Duration;

use axum_test::TestServer;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::{Value, json};
use tempfile::TempDir;

use codemall_api::{
    config::{AppConfig, AuthConfig, DatabaseConfig},
    db,
    entity::{products, users},
    middleware::auth::AuthUser,
    models::Role,
    routes,
    services::auth_service,
    state::AppState,
    utils::password::hash_password,
};

pub const JWT_SECRET: &str = "test-secret";
pub const PASSWORD: &str = "secret123";

/// State backed by a fresh in-memory SQLite database. Keep the returned
/// directory alive for as long as uploads are written.
pub async fn setup_state() -> anyhow::Result<(AppState, TempDir)> {
    let uploads = tempfile::tempdir()?;
    let url = "sqlite::memory:".to_string();

    let config = AppConfig {
        host: "127.0.0.1".into(),
        port: 0,
        upload_dir: uploads.path().to_string_lossy().into_owned(),
        upload_max_bytes: 1024,
        database: DatabaseConfig {
            host: "localhost".into(),
            port: 3306,
            user: "root".into(),
            password: String::new(),
            name: "codemall_test".into(),
            url_override: Some(url.clone()),
            pool_size: 1,
            connect_attempts: 1,
            connect_delay: Duration::from_millis(10),
            allow_empty_password_fallback: false,
        },
        auth: AuthConfig {
            jwt_secret: JWT_SECRET.into(),
            jwt_expires_in: Duration::from_secs(3600),
            pbkdf2_iterations: 10,
        },
    };

    let orm = db::create_pool(url, 1).await?;
    db::migrate(&orm).await?;
    Ok((AppState::new(orm, config), uploads))
}

pub async fn setup_server() -> anyhow::Result<(TestServer, AppState, TempDir)> {
    let (state, uploads) = setup_state().await?;
    let server = TestServer::new(routes::app(state.clone()))?;
    Ok((server, state, uploads))
}

/// A stored account together with a token for it.
pub struct TestUser {
    pub id: i32,
    pub token: String,
    pub auth: AuthUser,
}

pub async fn create_user(state: &AppState, email: &str, role: Role) -> anyhow::Result<TestUser> {
    let model = users::ActiveModel {
        name: Set(email.split('@').next().unwrap_or("user").to_string()),
        email: Set(email.to_string()),
        role: Set(role),
        password_hash: Set(Some(hash_password(PASSWORD, 10))),
        banned: Set(false),
        avatar: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;

    let token = auth_service::issue_token(state, &model)?;
    Ok(TestUser {
        id: model.id,
        token,
        auth: AuthUser {
            user_id: model.id,
            role,
            email: Some(model.email),
        },
    })
}

pub async fn create_product(
    state: &AppState,
    seller_id: Option<i32>,
    name: &str,
    price: f64,
) -> anyhow::Result<products::Model> {
    Ok(products::ActiveModel {
        name: Set(name.to_string()),
        kind: Set("template".into()),
        category: Set(Some("web".into())),
        price: Set(price),
        seller_id: Set(seller_id),
        approved: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?)
}

/// Registers through the HTTP API and returns the response body.
pub async fn register(server: &TestServer, name: &str, email: &str, role: &str) -> Value {
    server
        .post("/api/auth/register")
        .json(&json!({ "name": name, "email": email, "password": PASSWORD, "role": role }))
        .await
        .json::<Value>()
}
