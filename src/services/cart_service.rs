use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait, sea_query::Expr,
};

use crate::{
    audit,
    dto::cart::{AddToCartRequest, CartList, ReplaceCartRequest, UpdateCartItemRequest},
    entity::{CartItems, ProductImages, Products, cart_items, product_images, products},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::CartItem,
    response::ApiResponse,
    state::AppState,
};

/// Quantities below 1 are treated as 1.
pub fn normalize_quantity(quantity: Option<i32>) -> i32 {
    quantity.unwrap_or(1).max(1)
}

async fn cart_lines<C: ConnectionTrait>(conn: &C, user_id: i32) -> AppResult<Vec<CartItem>> {
    let items = CartItems::find()
        .filter(cart_items::Column::UserId.eq(user_id))
        .order_by_asc(cart_items::Column::Id)
        .all(conn)
        .await?
        .into_iter()
        .map(CartItem::from)
        .collect();
    Ok(items)
}

async fn cart_response<C: ConnectionTrait>(conn: &C, user_id: i32) -> AppResult<ApiResponse<CartList>> {
    let items = cart_lines(conn, user_id).await?;
    Ok(ApiResponse::success("OK", CartList { items }, None))
}

async fn first_image<C: ConnectionTrait>(conn: &C, product_id: i32) -> AppResult<Option<String>> {
    let image = ProductImages::find()
        .filter(product_images::Column::ProductId.eq(product_id))
        .order_by_asc(product_images::Column::Id)
        .one(conn)
        .await?;
    Ok(image.map(|img| img.url))
}

async fn new_line<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    product: &products::Model,
    quantity: i32,
) -> AppResult<cart_items::Model> {
    let line = cart_items::ActiveModel {
        user_id: Set(user_id),
        product_id: Set(product.id),
        name: Set(product.name.clone()),
        price: Set(product.price),
        quantity: Set(quantity),
        image: Set(first_image(conn, product.id).await?),
        seller_id: Set(product.seller_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(line)
}

pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    cart_response(&state.orm, user.user_id).await
}

/// Adds `quantity` to an existing line in a single UPDATE so concurrent adds
/// never lose an increment. Returns false when the cart has no such line.
async fn increment_line<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    product_id: i32,
    quantity: i32,
) -> AppResult<bool> {
    let result = CartItems::update_many()
        .col_expr(
            cart_items::Column::Quantity,
            Expr::col(cart_items::Column::Quantity).add(quantity),
        )
        .filter(cart_items::Column::UserId.eq(user_id))
        .filter(cart_items::Column::ProductId.eq(product_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected > 0)
}

pub async fn add_item(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartList>> {
    let quantity = normalize_quantity(payload.quantity);
    let product = Products::find_by_id(payload.product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    if !increment_line(&state.orm, user.user_id, product.id, quantity).await? {
        match new_line(&state.orm, user.user_id, &product, quantity).await {
            Ok(_) => {}
            // Another request inserted the line first; add on top of it.
            Err(AppError::Conflict(_)) => {
                increment_line(&state.orm, user.user_id, product.id, quantity).await?;
            }
            Err(err) => return Err(err),
        }
    }

    audit::record(
        &state.orm,
        Some(user.user_id),
        "cart_add",
        "cart_items",
        serde_json::json!({ "product_id": product.id, "quantity": quantity }),
    )
    .await;

    cart_response(&state.orm, user.user_id).await
}

pub async fn update_quantity(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartList>> {
    CartItems::update_many()
        .col_expr(
            cart_items::Column::Quantity,
            Expr::value(normalize_quantity(Some(payload.quantity))),
        )
        .filter(cart_items::Column::UserId.eq(user.user_id))
        .filter(cart_items::Column::ProductId.eq(payload.product_id))
        .exec(&state.orm)
        .await?;
    cart_response(&state.orm, user.user_id).await
}

pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    product_id: i32,
) -> AppResult<ApiResponse<CartList>> {
    CartItems::delete_many()
        .filter(cart_items::Column::UserId.eq(user.user_id))
        .filter(cart_items::Column::ProductId.eq(product_id))
        .exec(&state.orm)
        .await?;
    cart_response(&state.orm, user.user_id).await
}

pub async fn clear_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    CartItems::delete_many()
        .filter(cart_items::Column::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;
    Ok(ApiResponse::success("Cart cleared", CartList { items: Vec::new() }, None))
}

/// Replaces the whole cart. Lines for unknown products are skipped and
/// repeated products are merged.
pub async fn replace_cart(
    state: &AppState,
    user: &AuthUser,
    payload: ReplaceCartRequest,
) -> AppResult<ApiResponse<CartList>> {
    let mut order: Vec<i32> = Vec::new();
    let mut quantities: BTreeMap<i32, i32> = BTreeMap::new();
    for line in payload.items {
        let quantity = normalize_quantity(line.quantity);
        quantities
            .entry(line.product_id)
            .and_modify(|q| *q = q.saturating_add(quantity))
            .or_insert_with(|| {
                order.push(line.product_id);
                quantity
            });
    }

    let known: BTreeMap<i32, products::Model> = Products::find()
        .filter(products::Column::Id.is_in(order.clone()))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let txn = state.orm.begin().await?;
    CartItems::delete_many()
        .filter(cart_items::Column::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;
    for product_id in &order {
        if let (Some(product), Some(quantity)) = (known.get(product_id), quantities.get(product_id)) {
            new_line(&txn, user.user_id, product, *quantity).await?;
        }
    }
    let response = cart_response(&txn, user.user_id).await?;
    txn.commit().await?;

    Ok(response)
}
