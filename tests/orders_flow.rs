mod common;

use axum::http::StatusCode;

use codemall_api::{
    dto::{
        cart::AddToCartRequest,
        orders::{CreateOrderRequest, OrderItemInput, UpdateOrderStatusRequest},
    },
    models::{NotificationKind, OrderStatus, Role},
    routes::params::{MyOrdersQuery, OrderSide, Pagination},
    services::{cart_service, notification_service, order_service},
};

fn item(product_id: i32, seller_id: i32, price: f64, quantity: i32) -> OrderItemInput {
    OrderItemInput {
        product_id,
        seller_id,
        name: Some(format!("Product {product_id}")),
        price,
        quantity,
    }
}

// Buyer orders from a seller -> seller is notified -> seller delivers -> buyer is notified.
#[tokio::test]
async fn order_lifecycle() -> anyhow::Result<()> {
    let (state, _uploads) = common::setup_state().await?;
    let buyer = common::create_user(&state, "bob@example.com", Role::Buyer).await?;
    let seller = common::create_user(&state, "sam@example.com", Role::Seller).await?;
    let stranger = common::create_user(&state, "eve@example.com", Role::Buyer).await?;

    let created = order_service::create_order(
        &state,
        &buyer.auth,
        CreateOrderRequest {
            items: vec![item(1, seller.id, 10.0, 2), item(2, seller.id, 5.0, 1)],
        },
    )
    .await?;
    let order = created.data.expect("order");
    assert_eq!(order.total, 25.0);
    assert_eq!(order.status, OrderStatus::EmAndamento);
    assert_eq!(order.items.len(), 2);

    let seller_inbox = notification_service::list_mine(&state, &seller.auth, Pagination::default()).await?;
    let seller_inbox = seller_inbox.data.expect("notifications").items;
    assert_eq!(seller_inbox.len(), 1);
    assert_eq!(seller_inbox[0].kind, NotificationKind::Order);

    let denied = order_service::get_order(&state, &stranger.auth, order.id)
        .await
        .unwrap_err();
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let denied = order_service::update_status(
        &state,
        &buyer.auth,
        order.id,
        UpdateOrderStatusRequest {
            status: "entregue".into(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let invalid = order_service::update_status(
        &state,
        &seller.auth,
        order.id,
        UpdateOrderStatusRequest {
            status: "shipped".into(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

    let missing = order_service::update_status(
        &state,
        &seller.auth,
        9999,
        UpdateOrderStatusRequest {
            status: "entregue".into(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    order_service::update_status(
        &state,
        &seller.auth,
        order.id,
        UpdateOrderStatusRequest {
            status: "entregue".into(),
        },
    )
    .await?;

    let fetched = order_service::get_order(&state, &buyer.auth, order.id).await?;
    assert_eq!(fetched.data.expect("order").status, OrderStatus::Entregue);

    let buyer_inbox = notification_service::list_mine(&state, &buyer.auth, Pagination::default()).await?;
    assert_eq!(buyer_inbox.data.expect("notifications").items.len(), 1);

    let sold = order_service::list_mine(
        &state,
        &seller.auth,
        MyOrdersQuery {
            role: Some(OrderSide::Seller),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(sold.data.expect("orders").items.len(), 1);

    let bought_by_seller = order_service::list_mine(&state, &seller.auth, MyOrdersQuery::default()).await?;
    assert!(bought_by_seller.data.expect("orders").items.is_empty());
    Ok(())
}

#[tokio::test]
async fn admins_and_sellers_can_cancel() -> anyhow::Result<()> {
    let (state, _uploads) = common::setup_state().await?;
    let admin = common::create_user(&state, "root@example.com", Role::Admin).await?;
    let buyer = common::create_user(&state, "bob@example.com", Role::Buyer).await?;
    let seller = common::create_user(&state, "sam@example.com", Role::Seller).await?;

    for actor in [&seller, &admin] {
        let order = order_service::create_order(
            &state,
            &buyer.auth,
            CreateOrderRequest {
                items: vec![item(1, seller.id, 9.5, 1)],
            },
        )
        .await?
        .data
        .expect("order");

        let cancelled = order_service::update_status(
            &state,
            &actor.auth,
            order.id,
            UpdateOrderStatusRequest {
                status: " cancelado ".into(),
            },
        )
        .await?
        .data
        .expect("order");
        assert_eq!(cancelled.status, OrderStatus::Cancelado);
        assert_eq!(cancelled.items.len(), 1);
        assert_eq!(cancelled.total, 9.5);

        let fetched = order_service::get_order(&state, &buyer.auth, order.id).await?;
        assert_eq!(fetched.data.expect("order").status, OrderStatus::Cancelado);
    }

    let inbox = notification_service::list_mine(&state, &buyer.auth, Pagination::default()).await?;
    assert_eq!(inbox.data.expect("notifications").items.len(), 2);
    Ok(())
}

#[tokio::test]
async fn rejects_empty_or_invalid_items() -> anyhow::Result<()> {
    let (state, _uploads) = common::setup_state().await?;
    let buyer = common::create_user(&state, "bob@example.com", Role::Buyer).await?;

    for items in [vec![], vec![item(1, 2, 10.0, 0)], vec![item(1, 2, -1.0, 1)]] {
        let err = order_service::create_order(&state, &buyer.auth, CreateOrderRequest { items })
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
    Ok(())
}

#[tokio::test]
async fn checkout_turns_the_cart_into_an_order() -> anyhow::Result<()> {
    let (state, _uploads) = common::setup_state().await?;
    let buyer = common::create_user(&state, "bob@example.com", Role::Buyer).await?;
    let seller = common::create_user(&state, "sam@example.com", Role::Seller).await?;
    let product = common::create_product(&state, Some(seller.id), "Theme", 12.5).await?;

    let empty = order_service::checkout(&state, &buyer.auth).await.unwrap_err();
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

    for _ in 0..2 {
        cart_service::add_item(
            &state,
            &buyer.auth,
            AddToCartRequest {
                product_id: product.id,
                quantity: Some(1),
            },
        )
        .await?;
    }

    let order = order_service::checkout(&state, &buyer.auth)
        .await?
        .data
        .expect("order");
    assert_eq!(order.total, 25.0);
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].quantity, 2);
    assert_eq!(order.items[0].seller_id, Some(seller.id));

    let cart = cart_service::list_cart(&state, &buyer.auth).await?;
    assert!(cart.data.expect("cart").items.is_empty());
    Ok(())
}
