mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

use codemall_api::{dto::cart::AddToCartRequest, models::Role, services::cart_service};

#[tokio::test]
async fn cart_add_update_remove_and_replace() -> anyhow::Result<()> {
    let (server, state, _uploads) = common::setup_server().await?;
    let seller = common::create_user(&state, "sam@example.com", Role::Seller).await?;
    let buyer = common::create_user(&state, "bob@example.com", Role::Buyer).await?;
    let theme = common::create_product(&state, Some(seller.id), "Theme", 10.0).await?;
    let plugin = common::create_product(&state, Some(seller.id), "Plugin", 4.0).await?;

    server
        .get("/api/cart")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let added = server
        .post("/api/cart/add")
        .authorization_bearer(&buyer.token)
        .json(&json!({ "product_id": theme.id, "quantity": 0 }))
        .await;
    added.assert_status_ok();
    let added = added.json::<Value>();
    assert_eq!(added["data"][0]["quantity"], 1);
    assert_eq!(added["data"][0]["name"], "Theme");
    assert_eq!(added["data"][0]["seller_id"], seller.id);

    let again = server
        .post("/api/cart/add")
        .authorization_bearer(&buyer.token)
        .json(&json!({ "product_id": theme.id, "quantity": 2 }))
        .await
        .json::<Value>();
    assert_eq!(again["data"][0]["quantity"], 3);

    server
        .post("/api/cart/add")
        .authorization_bearer(&buyer.token)
        .json(&json!({ "product_id": 9999 }))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let updated = server
        .patch("/api/cart/update")
        .authorization_bearer(&buyer.token)
        .json(&json!({ "product_id": theme.id, "quantity": 5 }))
        .await
        .json::<Value>();
    assert_eq!(updated["data"][0]["quantity"], 5);

    let replaced = server
        .put("/api/cart")
        .authorization_bearer(&buyer.token)
        .json(&json!({ "items": [
            { "product_id": plugin.id, "quantity": 1 },
            { "product_id": 9999, "quantity": 1 },
            { "product_id": plugin.id, "quantity": 2 },
        ] }))
        .await
        .json::<Value>();
    let lines = replaced["data"].as_array().expect("lines");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["product_id"], plugin.id);
    assert_eq!(lines[0]["quantity"], 3);

    let removed = server
        .delete(&format!("/api/cart/{}", plugin.id))
        .authorization_bearer(&buyer.token)
        .await
        .json::<Value>();
    assert_eq!(removed["data"].as_array().map(Vec::len), Some(0));

    server
        .post("/api/cart/add")
        .authorization_bearer(&buyer.token)
        .json(&json!({ "product_id": theme.id }))
        .await
        .assert_status_ok();
    let cleared = server
        .post("/api/cart/clear")
        .authorization_bearer(&buyer.token)
        .await
        .json::<Value>();
    assert_eq!(cleared["data"].as_array().map(Vec::len), Some(0));
    Ok(())
}

#[tokio::test]
async fn carts_are_private() -> anyhow::Result<()> {
    let (server, state, _uploads) = common::setup_server().await?;
    let alice = common::create_user(&state, "alice@example.com", Role::Buyer).await?;
    let bob = common::create_user(&state, "bob@example.com", Role::Buyer).await?;
    let product = common::create_product(&state, None, "Theme", 10.0).await?;

    server
        .post("/api/cart/add")
        .authorization_bearer(&alice.token)
        .json(&json!({ "product_id": product.id }))
        .await
        .assert_status_ok();

    let bobs = server
        .get("/api/cart")
        .authorization_bearer(&bob.token)
        .await
        .json::<Value>();
    assert_eq!(bobs["data"].as_array().map(Vec::len), Some(0));
    Ok(())
}

#[tokio::test]
async fn overlapping_adds_keep_every_increment() -> anyhow::Result<()> {
    let (state, _uploads) = common::setup_state().await?;
    let buyer = common::create_user(&state, "bob@example.com", Role::Buyer).await?;
    let theme = common::create_product(&state, None, "Theme", 10.0).await?;

    let add = |quantity| {
        cart_service::add_item(
            &state,
            &buyer.auth,
            AddToCartRequest {
                product_id: theme.id,
                quantity: Some(quantity),
            },
        )
    };
    let (first, second) = tokio::join!(add(2), add(3));
    first?;
    second?;

    let cart = cart_service::list_cart(&state, &buyer.auth).await?;
    let items = cart.data.expect("cart").items;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 5);
    Ok(())
}
