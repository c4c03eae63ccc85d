use std::collections::BTreeMap;

use sea_orm::{
    ColumnTrait, EntityTrait, Iterable, PaginatorTrait, QueryFilter, QuerySelect,
};

use crate::{
    dto::metrics::{Dashboard, OrderMetrics, ProductMetrics, UserMetrics},
    entity::{Orders, Products, Users, orders, products, users},
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    models::{OrderStatus, Role},
    response::ApiResponse,
    state::AppState,
};

async fn product_metrics(state: &AppState) -> AppResult<ProductMetrics> {
    let approved = Products::find()
        .filter(products::Column::Approved.eq(true))
        .count(&state.orm)
        .await?;
    let pending = Products::find()
        .filter(products::Column::Approved.eq(false))
        .count(&state.orm)
        .await?;
    Ok(ProductMetrics { approved, pending })
}

async fn count_role(state: &AppState, role: Role) -> AppResult<u64> {
    Ok(Users::find()
        .filter(users::Column::Role.eq(role))
        .count(&state.orm)
        .await?)
}

async fn user_metrics(state: &AppState) -> AppResult<UserMetrics> {
    Ok(UserMetrics {
        buyers: count_role(state, Role::Buyer).await?,
        sellers: count_role(state, Role::Seller).await?,
        admins: count_role(state, Role::Admin).await?,
        banned: Users::find()
            .filter(users::Column::Banned.eq(true))
            .count(&state.orm)
            .await?,
    })
}

async fn order_metrics(state: &AppState) -> AppResult<OrderMetrics> {
    let total = Orders::find().count(&state.orm).await?;

    let revenue: Option<f64> = Orders::find()
        .select_only()
        .column_as(orders::Column::Total.sum(), "revenue")
        .into_tuple()
        .one(&state.orm)
        .await?
        .flatten();
    let revenue = (revenue.unwrap_or(0.0) * 100.0).round() / 100.0;

    let counts: Vec<(OrderStatus, i64)> = Orders::find()
        .select_only()
        .column(orders::Column::Status)
        .column_as(orders::Column::Id.count(), "count")
        .group_by(orders::Column::Status)
        .into_tuple()
        .all(&state.orm)
        .await?;

    // Statuses without orders still show up with 0.
    let mut by_status: BTreeMap<String, u64> = OrderStatus::iter()
        .map(|status| (status.as_str().to_string(), 0))
        .collect();
    for (status, count) in counts {
        by_status.insert(status.as_str().to_string(), u64::try_from(count).unwrap_or(0));
    }

    Ok(OrderMetrics {
        total,
        revenue,
        by_status,
    })
}

pub async fn dashboard(state: &AppState, admin: &AuthUser) -> AppResult<ApiResponse<Dashboard>> {
    ensure_admin(admin)?;
    let dashboard = Dashboard {
        products: product_metrics(state).await?,
        users: user_metrics(state).await?,
        orders: order_metrics(state).await?,
    };
    Ok(ApiResponse::success("OK", dashboard, None))
}
