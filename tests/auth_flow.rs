mod common;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::{Value, json};

use codemall_api::{
    models::Role,
    utils::token::{Claims, sign},
};

#[tokio::test]
async fn register_login_and_me() -> anyhow::Result<()> {
    let (server, _state, _uploads) = common::setup_server().await?;

    let response = server
        .post("/api/auth/register")
        .json(&json!({ "name": "Ana", "email": "  Ana@Example.com ", "password": "secret123" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body = response.json::<Value>();
    assert_eq!(body["data"]["user"]["email"], "ana@example.com");
    assert_eq!(body["data"]["user"]["role"], "buyer");
    assert!(body["data"]["user"].get("password_hash").is_none());

    let login = server
        .post("/api/auth/login")
        .json(&json!({ "email": "ANA@example.com", "password": "secret123" }))
        .await;
    login.assert_status_ok();
    let token = login.json::<Value>()["data"]["token"]
        .as_str()
        .expect("token")
        .to_string();

    let me = server.get("/api/auth/me").authorization_bearer(&token).await;
    me.assert_status_ok();
    let me = me.json::<Value>();
    assert_eq!(me["data"]["id"], body["data"]["user"]["id"]);
    assert_eq!(me["data"]["role"], "buyer");
    assert_eq!(me["data"]["email"], "ana@example.com");
    Ok(())
}

#[tokio::test]
async fn duplicate_email_conflicts_regardless_of_case() -> anyhow::Result<()> {
    let (server, _state, _uploads) = common::setup_server().await?;
    common::register(&server, "Ana", "ana@example.com", "buyer").await;

    let again = server
        .post("/api/auth/register")
        .json(&json!({ "name": "Other", "email": "ANA@EXAMPLE.COM", "password": "x1" }))
        .await;
    again.assert_status(StatusCode::CONFLICT);
    assert_eq!(again.json::<Value>()["error"], "Email already in use");
    Ok(())
}

#[tokio::test]
async fn register_validates_input() -> anyhow::Result<()> {
    let (server, _state, _uploads) = common::setup_server().await?;

    let missing = server
        .post("/api/auth/register")
        .json(&json!({ "name": "Ana", "email": "ana@example.com" }))
        .await;
    missing.assert_status(StatusCode::BAD_REQUEST);

    let admin = server
        .post("/api/auth/register")
        .json(&json!({ "name": "Eve", "email": "eve@example.com", "password": "x", "role": "admin" }))
        .await;
    admin.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(admin.json::<Value>()["error"], "Invalid role");

    let seller = common::register(&server, "Sam", "sam@example.com", "seller").await;
    assert_eq!(seller["data"]["user"]["role"], "seller");
    Ok(())
}

#[tokio::test]
async fn login_does_not_reveal_which_part_was_wrong() -> anyhow::Result<()> {
    let (server, _state, _uploads) = common::setup_server().await?;
    common::register(&server, "Ana", "ana@example.com", "buyer").await;

    let wrong_password = server
        .post("/api/auth/login")
        .json(&json!({ "email": "ana@example.com", "password": "nope" }))
        .await;
    let unknown_email = server
        .post("/api/auth/login")
        .json(&json!({ "email": "who@example.com", "password": "secret123" }))
        .await;

    wrong_password.assert_status(StatusCode::UNAUTHORIZED);
    unknown_email.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(
        wrong_password.json::<Value>(),
        unknown_email.json::<Value>()
    );
    Ok(())
}

#[tokio::test]
async fn rejects_missing_invalid_and_expired_tokens() -> anyhow::Result<()> {
    let (server, _state, _uploads) = common::setup_server().await?;

    let missing = server.get("/api/auth/me").await;
    missing.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(missing.json::<Value>()["error"], "Missing token");

    let invalid = server.get("/api/auth/me").authorization_bearer("not-a-jwt").await;
    invalid.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(invalid.json::<Value>()["error"], "Invalid token");

    let mut claims = Claims::new(1, Role::Buyer, None, Duration::from_secs(60));
    claims.iat -= 7200;
    claims.exp = claims.iat + 60;
    let expired = sign(&claims, common::JWT_SECRET)?;
    let expired = server.get("/api/auth/me").authorization_bearer(expired).await;
    expired.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(expired.json::<Value>()["error"], "Token expired");
    Ok(())
}

#[tokio::test]
async fn banned_accounts_cannot_log_in() -> anyhow::Result<()> {
    let (server, state, _uploads) = common::setup_server().await?;
    let admin = common::create_user(&state, "root@example.com", Role::Admin).await?;
    let buyer = common::create_user(&state, "bob@example.com", Role::Buyer).await?;

    server
        .post(&format!("/api/admin/users/{}/ban", buyer.id))
        .authorization_bearer(&admin.token)
        .await
        .assert_status_ok();

    let login = server
        .post("/api/auth/login")
        .json(&json!({ "email": "bob@example.com", "password": common::PASSWORD }))
        .await;
    login.assert_status(StatusCode::FORBIDDEN);
    Ok(())
}
