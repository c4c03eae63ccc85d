use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, Set};

use crate::{
    audit,
    dto::orders::OrderList,
    entity::{Orders, Products, Users, orders},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Product, User},
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::order_service::paginate_orders,
    state::AppState,
};

pub async fn set_banned(
    state: &AppState,
    admin: &AuthUser,
    user_id: i32,
    banned: bool,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(admin)?;
    if banned && user_id == admin.user_id {
        return Err(AppError::BadRequest("You cannot ban yourself".into()));
    }

    let user = Users::find_by_id(user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let updated = if user.banned == banned {
        user
    } else {
        let mut active = user.into_active_model();
        active.banned = Set(banned);
        active.update(&state.orm).await?
    };

    audit::record(
        &state.orm,
        Some(admin.user_id),
        if banned { "user_ban" } else { "user_unban" },
        "users",
        serde_json::json!({ "user_id": user_id }),
    )
    .await;

    let message = if banned { "User banned" } else { "User unbanned" };
    Ok(ApiResponse::success(message, User::from(updated), None))
}

pub async fn set_approved(
    state: &AppState,
    admin: &AuthUser,
    product_id: i32,
    approved: bool,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(admin)?;
    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    let updated = if product.approved == approved {
        product
    } else {
        let mut active = product.into_active_model();
        active.approved = Set(approved);
        active.update(&state.orm).await?
    };

    audit::record(
        &state.orm,
        Some(admin.user_id),
        if approved { "product_approve" } else { "product_revoke" },
        "products",
        serde_json::json!({ "product_id": product_id }),
    )
    .await;

    let message = if approved { "Product approved" } else { "Product approval revoked" };
    Ok(ApiResponse::success(message, Product::from(updated), None))
}

pub async fn list_all_orders(
    state: &AppState,
    admin: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(admin)?;
    let mut finder = Orders::find();
    if let Some(status) = query.status {
        finder = finder.filter(orders::Column::Status.eq(status));
    }
    paginate_orders(state, finder, query.pagination()).await
}
