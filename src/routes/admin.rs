use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::orders::OrderList,
    error::AppResult,
    middleware::{auth::AdminUser, extract::{AppPath, AppQuery}},
    models::{Product, User},
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::admin_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/{id}/ban", post(ban_user))
        .route("/users/{id}/unban", post(unban_user))
        .route("/products/{id}/approve", post(approve_product))
        .route("/products/{id}/revoke", post(revoke_product))
        .route("/orders", get(list_all_orders))
}

#[utoipa::path(
    post,
    path = "/api/admin/users/{id}/ban",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User banned", body = ApiResponse<User>),
        (status = 400, description = "Admins cannot ban themselves"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn ban_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = admin_service::set_banned(&state, &admin, id, true).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/users/{id}/unban",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User unbanned", body = ApiResponse<User>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn unban_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = admin_service::set_banned(&state, &admin, id, false).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/products/{id}/approve",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product approved", body = ApiResponse<Product>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn approve_product(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = admin_service::set_approved(&state, &admin, id, true).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/products/{id}/revoke",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Approval revoked", body = ApiResponse<Product>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn revoke_product(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = admin_service::set_approved(&state, &admin, id, false).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Get all orders (admin only)", body = ApiResponse<OrderList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppQuery(query): AppQuery<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = admin_service::list_all_orders(&state, &admin, query).await?;
    Ok(Json(resp))
}
