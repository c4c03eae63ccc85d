mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

use codemall_api::models::Role;

#[tokio::test]
async fn favorites_are_idempotent() -> anyhow::Result<()> {
    let (server, state, _uploads) = common::setup_server().await?;
    let buyer = common::create_user(&state, "bob@example.com", Role::Buyer).await?;
    let seller = common::create_user(&state, "sam@example.com", Role::Seller).await?;
    let product = common::create_product(&state, Some(seller.id), "Theme", 10.0).await?;

    let target = json!({ "target_type": "product", "target_id": product.id });
    let first = server
        .post("/api/favorites")
        .authorization_bearer(&buyer.token)
        .json(&target)
        .await;
    first.assert_status(StatusCode::CREATED);
    let second = server
        .post("/api/favorites")
        .authorization_bearer(&buyer.token)
        .json(&target)
        .await;
    second.assert_status(StatusCode::CREATED);
    assert_eq!(
        first.json::<Value>()["data"]["id"],
        second.json::<Value>()["data"]["id"]
    );

    server
        .post("/api/favorites")
        .authorization_bearer(&buyer.token)
        .json(&json!({ "target_type": "seller", "target_id": seller.id }))
        .await
        .assert_status(StatusCode::CREATED);

    let all = server
        .get("/api/favorites")
        .authorization_bearer(&buyer.token)
        .await
        .json::<Value>();
    assert_eq!(all["meta"]["total"], 2);

    let sellers = server
        .get("/api/favorites")
        .add_query_param("target_type", "seller")
        .authorization_bearer(&buyer.token)
        .await
        .json::<Value>();
    assert_eq!(sellers["meta"]["total"], 1);
    assert_eq!(sellers["data"][0]["target_id"], seller.id);

    server
        .delete("/api/favorites")
        .authorization_bearer(&buyer.token)
        .json(&target)
        .await
        .assert_status_ok();
    let remaining = server
        .get("/api/favorites")
        .authorization_bearer(&buyer.token)
        .await
        .json::<Value>();
    assert_eq!(remaining["meta"]["total"], 1);
    Ok(())
}

#[tokio::test]
async fn reviews_summary_and_single_reply() -> anyhow::Result<()> {
    let (server, state, _uploads) = common::setup_server().await?;
    let buyer = common::create_user(&state, "bob@example.com", Role::Buyer).await?;
    let other = common::create_user(&state, "ann@example.com", Role::Buyer).await?;
    let seller = common::create_user(&state, "sam@example.com", Role::Seller).await?;
    let rival = common::create_user(&state, "rob@example.com", Role::Seller).await?;
    let product = common::create_product(&state, Some(seller.id), "Theme", 10.0).await?;

    let empty = server
        .get("/api/reviews/summary")
        .add_query_param("target_type", "product")
        .add_query_param("target_id", product.id)
        .await
        .json::<Value>();
    assert_eq!(empty["data"], json!({ "count": 0, "avg": 0.0 }));

    server
        .post("/api/reviews")
        .authorization_bearer(&buyer.token)
        .json(&json!({ "target_type": "product", "target_id": product.id, "rating": 6 }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .post("/api/reviews")
        .authorization_bearer(&buyer.token)
        .json(&json!({ "target_type": "product", "target_id": 9999, "rating": 5 }))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let long_comment = "a".repeat(1500);
    let review = server
        .post("/api/reviews")
        .authorization_bearer(&buyer.token)
        .json(&json!({
            "target_type": "product",
            "target_id": product.id,
            "rating": 5,
            "comment": long_comment,
        }))
        .await;
    review.assert_status(StatusCode::CREATED);
    let review = review.json::<Value>();
    assert_eq!(review["data"]["comment"].as_str().map(str::len), Some(1000));
    let review_id = review["data"]["id"].as_i64().expect("review id");

    for (user, rating) in [(&other, 4), (&other, 4)] {
        server
            .post("/api/reviews")
            .authorization_bearer(&user.token)
            .json(&json!({ "target_type": "product", "target_id": product.id, "rating": rating }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let summary = server
        .get("/api/reviews/summary")
        .add_query_param("target_type", "product")
        .add_query_param("target_id", product.id)
        .await
        .json::<Value>();
    assert_eq!(summary["data"]["count"], 3);
    assert_eq!(summary["data"]["avg"], 4.33);

    let listed = server
        .get("/api/reviews")
        .add_query_param("target_id", product.id)
        .await
        .json::<Value>();
    assert_eq!(listed["meta"]["total"], 3);

    let reply_url = format!("/api/reviews/{review_id}/reply");
    server
        .post(&reply_url)
        .authorization_bearer(&rival.token)
        .json(&json!({ "message": "not mine" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let replied = server
        .post(&reply_url)
        .authorization_bearer(&seller.token)
        .json(&json!({ "message": "Thanks!" }))
        .await;
    replied.assert_status_ok();
    let replied = replied.json::<Value>();
    assert_eq!(replied["data"]["reply"]["message"], "Thanks!");
    assert_eq!(replied["data"]["reply"]["seller_id"], seller.id);

    let twice = server
        .post(&reply_url)
        .authorization_bearer(&seller.token)
        .json(&json!({ "message": "Again" }))
        .await;
    twice.assert_status(StatusCode::CONFLICT);

    server
        .post("/api/reviews/9999/reply")
        .authorization_bearer(&seller.token)
        .json(&json!({ "message": "?" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn notifications_follow_activity() -> anyhow::Result<()> {
    let (server, state, _uploads) = common::setup_server().await?;
    let buyer = common::create_user(&state, "bob@example.com", Role::Buyer).await?;
    let seller = common::create_user(&state, "sam@example.com", Role::Seller).await?;
    let product = common::create_product(&state, Some(seller.id), "Theme", 10.0).await?;

    server
        .post("/api/reviews")
        .authorization_bearer(&buyer.token)
        .json(&json!({ "target_type": "product", "target_id": product.id, "rating": 5 }))
        .await
        .assert_status(StatusCode::CREATED);
    server
        .post("/api/reviews")
        .authorization_bearer(&buyer.token)
        .json(&json!({ "target_type": "seller", "target_id": seller.id, "rating": 4 }))
        .await
        .assert_status(StatusCode::CREATED);

    let inbox = server
        .get("/api/notifications")
        .authorization_bearer(&seller.token)
        .await
        .json::<Value>();
    assert_eq!(inbox["meta"]["total"], 2);
    assert_eq!(inbox["data"][0]["type"], "review");
    assert_eq!(inbox["data"][0]["read"], false);
    let first_id = inbox["data"][0]["id"].as_i64().expect("id");

    server
        .post(&format!("/api/notifications/{first_id}/read"))
        .authorization_bearer(&buyer.token)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let read = server
        .post(&format!("/api/notifications/{first_id}/read"))
        .authorization_bearer(&seller.token)
        .await
        .json::<Value>();
    assert_eq!(read["data"]["read"], true);

    let all = server
        .post("/api/notifications/read-all")
        .authorization_bearer(&seller.token)
        .await
        .json::<Value>();
    assert_eq!(all["data"]["updated"], 1);
    Ok(())
}
