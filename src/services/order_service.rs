use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
    sea_query::Query,
};

use crate::{
    audit,
    dto::orders::{CreateOrderRequest, OrderItemInput, OrderList, UpdateOrderStatusRequest},
    entity::{CartItems, OrderItems, Orders, cart_items, order_items, orders},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{NotificationKind, Order, OrderStatus},
    response::{ApiResponse, Meta},
    routes::params::{MyOrdersQuery, OrderSide, Pagination},
    services::notification_service::notify,
    state::AppState,
};

/// One line of an order about to be inserted.
#[derive(Debug, Clone)]
struct NewLine {
    product_id: i32,
    seller_id: Option<i32>,
    name: Option<String>,
    price: f64,
    quantity: i32,
}

impl From<OrderItemInput> for NewLine {
    fn from(item: OrderItemInput) -> Self {
        Self {
            product_id: item.product_id,
            seller_id: Some(item.seller_id),
            name: item.name,
            price: item.price,
            quantity: item.quantity,
        }
    }
}

impl From<cart_items::Model> for NewLine {
    fn from(line: cart_items::Model) -> Self {
        Self {
            product_id: line.product_id,
            seller_id: line.seller_id,
            name: Some(line.name),
            price: line.price,
            quantity: line.quantity.max(1),
        }
    }
}

/// Sum of price x quantity. Computed once when the order is created.
fn order_total(lines: &[NewLine]) -> f64 {
    lines
        .iter()
        .map(|line| line.price * f64::from(line.quantity))
        .sum()
}

fn validate_items(items: &[OrderItemInput]) -> AppResult<()> {
    if items.is_empty() {
        return Err(AppError::BadRequest("items are required".into()));
    }
    for item in items {
        if item.quantity < 1 {
            return Err(AppError::BadRequest("quantity must be at least 1".into()));
        }
        if !item.price.is_finite() || item.price < 0.0 {
            return Err(AppError::BadRequest("price must be a number >= 0".into()));
        }
    }
    Ok(())
}

/// Loads the items of each order, preserving the order of `models`.
async fn attach_items<C: ConnectionTrait>(conn: &C, models: Vec<orders::Model>) -> AppResult<Vec<Order>> {
    let ids: Vec<i32> = models.iter().map(|o| o.id).collect();
    let mut grouped: HashMap<i32, Vec<order_items::Model>> = HashMap::new();
    if !ids.is_empty() {
        let items = OrderItems::find()
            .filter(order_items::Column::OrderId.is_in(ids))
            .order_by_asc(order_items::Column::Id)
            .all(conn)
            .await?;
        for item in items {
            grouped.entry(item.order_id).or_default().push(item);
        }
    }

    Ok(models
        .into_iter()
        .map(|model| {
            let items = grouped.remove(&model.id).unwrap_or_default();
            Order::from_parts(model, items)
        })
        .collect())
}

async fn find_order_model<C: ConnectionTrait>(conn: &C, id: i32) -> AppResult<orders::Model> {
    Orders::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))
}

async fn with_items<C: ConnectionTrait>(conn: &C, model: orders::Model) -> AppResult<Order> {
    let mut orders = attach_items(conn, vec![model]).await?;
    orders.pop().ok_or_else(|| AppError::not_found("Order"))
}

async fn load_order<C: ConnectionTrait>(conn: &C, id: i32) -> AppResult<Order> {
    let model = find_order_model(conn, id).await?;
    with_items(conn, model).await
}

pub(crate) async fn paginate_orders(
    state: &AppState,
    finder: Select<Orders>,
    pagination: Pagination,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, page_size, offset) = pagination.normalize();
    let finder = finder
        .order_by_desc(orders::Column::CreatedAt)
        .order_by_desc(orders::Column::Id);

    let total = finder.clone().count(&state.orm).await?;
    let models = finder
        .limit(page_size)
        .offset(offset)
        .all(&state.orm)
        .await?;
    let items = attach_items(&state.orm, models).await?;

    Ok(ApiResponse::success(
        "Ok",
        OrderList { items },
        Some(Meta::new(page, page_size, total)),
    ))
}

/// Inserts the order with its items and notifies every seller involved.
async fn insert_order<C: ConnectionTrait>(conn: &C, buyer_id: i32, lines: Vec<NewLine>) -> AppResult<Order> {
    let now = Utc::now();
    let order = orders::ActiveModel {
        buyer_id: Set(buyer_id),
        total: Set(order_total(&lines)),
        status: Set(OrderStatus::EmAndamento),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    let sellers: BTreeSet<i32> = lines.iter().filter_map(|line| line.seller_id).collect();

    let mut saved = Vec::with_capacity(lines.len());
    for line in lines {
        let row = order_items::ActiveModel {
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            seller_id: Set(line.seller_id),
            name: Set(line.name),
            price: Set(line.price),
            quantity: Set(line.quantity),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        saved.push(row);
    }

    for seller_id in sellers {
        notify(
            conn,
            seller_id,
            NotificationKind::Order,
            "New order",
            &format!("Order #{} includes your products", order.id),
            Some(serde_json::json!({ "order_id": order.id })),
        )
        .await?;
    }

    Ok(Order::from_parts(order, saved))
}

pub async fn create_order(
    state: &AppState,
    actor: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    validate_items(&payload.items)?;
    let lines = payload.items.into_iter().map(NewLine::from).collect();

    let txn = state.orm.begin().await?;
    let order = insert_order(&txn, actor.user_id, lines).await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        Some(actor.user_id),
        "order_create",
        "orders",
        serde_json::json!({ "order_id": order.id, "total": order.total }),
    )
    .await;

    Ok(ApiResponse::success("Order created", order, None))
}

/// Turns the actor's cart into an order and empties the cart.
pub async fn checkout(state: &AppState, actor: &AuthUser) -> AppResult<ApiResponse<Order>> {
    let txn = state.orm.begin().await?;

    let lines: Vec<NewLine> = CartItems::find()
        .filter(cart_items::Column::UserId.eq(actor.user_id))
        .order_by_asc(cart_items::Column::Id)
        .all(&txn)
        .await?
        .into_iter()
        .map(NewLine::from)
        .collect();
    if lines.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let order = insert_order(&txn, actor.user_id, lines).await?;
    CartItems::delete_many()
        .filter(cart_items::Column::UserId.eq(actor.user_id))
        .exec(&txn)
        .await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        Some(actor.user_id),
        "checkout",
        "orders",
        serde_json::json!({ "order_id": order.id, "total": order.total }),
    )
    .await;

    Ok(ApiResponse::success("Order created", order, None))
}

fn can_view(actor: &AuthUser, order: &Order) -> bool {
    actor.is_admin() || order.buyer_id == actor.user_id || order.involves_seller(actor.user_id)
}

pub async fn get_order(state: &AppState, actor: &AuthUser, id: i32) -> AppResult<ApiResponse<Order>> {
    let order = load_order(&state.orm, id).await?;
    if !can_view(actor, &order) {
        return Err(AppError::forbidden());
    }
    Ok(ApiResponse::success("OK", order, None))
}

pub async fn list_mine(
    state: &AppState,
    actor: &AuthUser,
    query: MyOrdersQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let condition = match query.role.unwrap_or_default() {
        OrderSide::Buyer => Condition::all().add(orders::Column::BuyerId.eq(actor.user_id)),
        OrderSide::Seller => Condition::all().add(
            orders::Column::Id.in_subquery(
                Query::select()
                    .column(order_items::Column::OrderId)
                    .from(OrderItems)
                    .and_where(order_items::Column::SellerId.eq(actor.user_id))
                    .to_owned(),
            ),
        ),
    };
    paginate_orders(state, Orders::find().filter(condition), query.pagination()).await
}

pub async fn update_status(
    state: &AppState,
    actor: &AuthUser,
    id: i32,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    let status: OrderStatus = payload
        .status
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid status".into()))?;

    let txn = state.orm.begin().await?;
    let model = find_order_model(&txn, id).await?;
    let order = with_items(&txn, model.clone()).await?;
    if !actor.is_admin() && !order.involves_seller(actor.user_id) {
        return Err(AppError::forbidden());
    }

    let mut active = model.into_active_model();
    active.status = Set(status);
    active.updated_at = Set(Utc::now());
    let updated = active.update(&txn).await?;

    notify(
        &txn,
        order.buyer_id,
        NotificationKind::Order,
        "Order status updated",
        &format!("Order #{} is now {}", order.id, status.as_str()),
        Some(serde_json::json!({ "order_id": order.id, "status": status })),
    )
    .await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        Some(actor.user_id),
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": id, "status": status }),
    )
    .await;

    let order = Order {
        status: updated.status,
        updated_at: updated.updated_at,
        ..order
    };
    Ok(ApiResponse::success("Order updated", order, None))
}
