mod common;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use serde_json::{Value, json};

use codemall_api::models::Role;

#[tokio::test]
async fn listing_paginates_and_is_stable() -> anyhow::Result<()> {
    let (server, state, _uploads) = common::setup_server().await?;
    for i in 0..25 {
        common::create_product(&state, None, &format!("Product {i:02}"), f64::from(i)).await?;
    }

    let first = server
        .get("/api/products")
        .add_query_param("page", 1)
        .add_query_param("pageSize", 20)
        .await;
    first.assert_status_ok();
    let first = first.json::<Value>();
    assert_eq!(first["data"].as_array().map(Vec::len), Some(20));
    assert_eq!(first["meta"]["total"], 25);
    assert_eq!(first["meta"]["totalPages"], 2);

    let again = server
        .get("/api/products")
        .add_query_param("page", 1)
        .add_query_param("pageSize", 20)
        .await
        .json::<Value>();
    assert_eq!(first, again);

    let second = server
        .get("/api/products")
        .add_query_param("page", 2)
        .add_query_param("pageSize", 20)
        .await
        .json::<Value>();
    assert_eq!(second["data"].as_array().map(Vec::len), Some(5));
    Ok(())
}

#[tokio::test]
async fn search_and_price_filters() -> anyhow::Result<()> {
    let (server, state, _uploads) = common::setup_server().await?;
    common::create_product(&state, None, "Dark Theme", 5.0).await?;
    common::create_product(&state, None, "Light theme", 15.0).await?;
    common::create_product(&state, None, "Analytics", 50.0).await?;

    let themes = server
        .get("/api/products")
        .add_query_param("q", "THEME")
        .await
        .json::<Value>();
    assert_eq!(themes["meta"]["total"], 2);

    let cheap = server
        .get("/api/products")
        .add_query_param("max_price", 10)
        .await
        .json::<Value>();
    assert_eq!(cheap["meta"]["total"], 1);
    assert_eq!(cheap["data"][0]["name"], "Dark Theme");
    Ok(())
}

#[tokio::test]
async fn sellers_manage_their_own_products() -> anyhow::Result<()> {
    let (server, state, _uploads) = common::setup_server().await?;
    let seller = common::create_user(&state, "sam@example.com", Role::Seller).await?;
    let rival = common::create_user(&state, "rob@example.com", Role::Seller).await?;
    let buyer = common::create_user(&state, "bob@example.com", Role::Buyer).await?;

    let payload = json!({ "name": "Invoice Script", "type": "script", "price": 12.5 });

    server
        .post("/api/products")
        .json(&payload)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    server
        .post("/api/products")
        .authorization_bearer(&buyer.token)
        .json(&payload)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let created = server
        .post("/api/products")
        .authorization_bearer(&seller.token)
        .json(&payload)
        .await;
    created.assert_status(StatusCode::CREATED);
    let created = created.json::<Value>();
    let id = created["data"]["id"].as_i64().expect("id");
    assert_eq!(created["data"]["seller_id"], seller.id);
    assert_eq!(created["data"]["approved"], false);
    assert_eq!(created["data"]["type"], "script");

    server
        .put(&format!("/api/products/{id}"))
        .authorization_bearer(&rival.token)
        .json(&json!({ "price": 1.0 }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    server
        .put(&format!("/api/products/{id}"))
        .json(&json!({ "price": 1.0 }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    server
        .delete(&format!("/api/products/{id}"))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let updated = server
        .put(&format!("/api/products/{id}"))
        .authorization_bearer(&seller.token)
        .json(&json!({ "price": 20.0 }))
        .await;
    updated.assert_status_ok();
    assert_eq!(updated.json::<Value>()["data"]["price"], 20.0);

    server
        .post("/api/products")
        .authorization_bearer(&seller.token)
        .json(&json!({ "name": "Bad", "type": "x", "price": -1 }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    server
        .delete(&format!("/api/products/{id}"))
        .authorization_bearer(&seller.token)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .get(&format!("/api/products/{id}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn images_by_link_and_by_upload() -> anyhow::Result<()> {
    let (server, state, uploads) = common::setup_server().await?;
    let seller = common::create_user(&state, "sam@example.com", Role::Seller).await?;
    let rival = common::create_user(&state, "rob@example.com", Role::Seller).await?;
    let product = common::create_product(&state, Some(seller.id), "Icon Pack", 7.9).await?;
    let images = format!("/api/products/{}/images", product.id);

    let linked = server
        .post(&images)
        .authorization_bearer(&seller.token)
        .json(&json!({ "filename": "cover.png", "url": "https://cdn.example.com/cover.png" }))
        .await;
    linked.assert_status(StatusCode::CREATED);

    server
        .post(&images)
        .authorization_bearer(&seller.token)
        .json(&json!({ "filename": "cover.png" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    server
        .post(&images)
        .authorization_bearer(&rival.token)
        .json(&json!({ "filename": "x.png", "url": "https://x" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"\x89PNG fake image".to_vec())
            .file_name("shot.PNG")
            .mime_type("image/png"),
    );
    let uploaded = server
        .post(&images)
        .authorization_bearer(&seller.token)
        .multipart(form)
        .await;
    uploaded.assert_status(StatusCode::CREATED);
    let uploaded = uploaded.json::<Value>();
    let url = uploaded["data"]["url"].as_str().expect("url").to_string();
    assert!(url.starts_with("/uploads/") && url.ends_with(".png"));
    assert_eq!(uploaded["data"]["filename"], "shot.PNG");

    let stored = uploads.path().join(url.trim_start_matches("/uploads/"));
    assert!(stored.exists());
    let served = server.get(&url).await;
    served.assert_status_ok();
    assert_eq!(served.as_bytes().to_vec(), b"\x89PNG fake image".to_vec());

    let too_big = MultipartForm::new().add_part(
        "file",
        Part::bytes(vec![0u8; 4096]).file_name("big.png").mime_type("image/png"),
    );
    server
        .post(&images)
        .authorization_bearer(&seller.token)
        .multipart(too_big)
        .await
        .assert_status(StatusCode::PAYLOAD_TOO_LARGE);

    let listed = server.get(&images).await.json::<Value>();
    assert_eq!(listed["data"].as_array().map(Vec::len), Some(2));

    let image_id = uploaded["data"]["id"].as_i64().expect("image id");
    server
        .delete(&format!("{images}/{image_id}"))
        .authorization_bearer(&seller.token)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    assert!(!stored.exists());

    server
        .get("/api/products/9999/images")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn admins_override_product_ownership() -> anyhow::Result<()> {
    let (server, state, _uploads) = common::setup_server().await?;
    let admin = common::create_user(&state, "root@example.com", Role::Admin).await?;
    let seller = common::create_user(&state, "sam@example.com", Role::Seller).await?;
    let product = common::create_product(&state, Some(seller.id), "Dark Theme", 5.0).await?;
    let path = format!("/api/products/{}", product.id);

    let updated = server
        .put(&path)
        .authorization_bearer(&admin.token)
        .json(&json!({ "name": "Dark Theme Pro" }))
        .await;
    updated.assert_status_ok();
    let updated = updated.json::<Value>();
    assert_eq!(updated["data"]["name"], "Dark Theme Pro");
    assert_eq!(updated["data"]["seller_id"], seller.id);

    server
        .delete(&path)
        .authorization_bearer(&admin.token)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server.get(&path).await.assert_status(StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn links_never_remove_files_uploaded_elsewhere() -> anyhow::Result<()> {
    let (server, state, uploads) = common::setup_server().await?;
    let owner = common::create_user(&state, "sam@example.com", Role::Seller).await?;
    let rival = common::create_user(&state, "rob@example.com", Role::Seller).await?;
    let theirs = common::create_product(&state, Some(owner.id), "Icon Pack", 7.9).await?;
    let mine = common::create_product(&state, Some(rival.id), "Copycat", 1.0).await?;

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"owner bytes".to_vec()).file_name("icon.png").mime_type("image/png"),
    );
    let uploaded = server
        .post(&format!("/api/products/{}/images", theirs.id))
        .authorization_bearer(&owner.token)
        .multipart(form)
        .await
        .json::<Value>();
    let url = uploaded["data"]["url"].as_str().expect("url").to_string();
    let image_id = uploaded["data"]["id"].as_i64().expect("image id");
    let stored = uploads.path().join(url.trim_start_matches("/uploads/"));

    let rival_images = format!("/api/products/{}/images", mine.id);
    server
        .post(&rival_images)
        .authorization_bearer(&rival.token)
        .json(&json!({ "filename": "icon.png", "url": url }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    // A link that only looks like an upload elsewhere is kept as a plain link.
    let linked = server
        .post(&rival_images)
        .authorization_bearer(&rival.token)
        .json(&json!({ "filename": "icon.png", "url": format!("https://mirror.example.com{url}") }))
        .await;
    linked.assert_status(StatusCode::CREATED);
    let link_id = linked.json::<Value>()["data"]["id"].as_i64().expect("link id");
    server
        .delete(&format!("{rival_images}/{link_id}"))
        .authorization_bearer(&rival.token)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    // The upload is addressed through its own product only.
    server
        .delete(&format!("{rival_images}/{image_id}"))
        .authorization_bearer(&rival.token)
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .delete(&format!("/api/products/9999/images/{image_id}"))
        .authorization_bearer(&owner.token)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    assert!(stored.exists());
    server.get(&url).await.assert_status_ok();
    let listed = server
        .get(&format!("/api/products/{}/images", theirs.id))
        .await
        .json::<Value>();
    assert_eq!(listed["data"].as_array().map(Vec::len), Some(1));
    Ok(())
}
