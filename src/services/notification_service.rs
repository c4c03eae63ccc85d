use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, sea_query::Expr,
};
use serde_json::Value;

use crate::{
    dto::notifications::{MarkAllReadResponse, NotificationList},
    entity::{Notifications, notifications},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Notification, NotificationKind},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

/// Queues an unread notification for `user_id`. Runs on whatever connection
/// the caller holds so it commits together with the triggering change.
pub async fn notify<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    kind: NotificationKind,
    title: &str,
    message: &str,
    data: Option<Value>,
) -> Result<notifications::Model, DbErr> {
    notifications::ActiveModel {
        user_id: Set(user_id),
        kind: Set(kind),
        title: Set(title.to_string()),
        message: Set(message.to_string()),
        data: Set(data),
        read: Set(false),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await
}

pub async fn list_mine(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<NotificationList>> {
    let (page, page_size, offset) = pagination.normalize();
    let finder = Notifications::find()
        .filter(notifications::Column::UserId.eq(user.user_id))
        .order_by_desc(notifications::Column::CreatedAt)
        .order_by_desc(notifications::Column::Id);

    let total = finder.clone().count(&state.orm).await?;
    let items = finder
        .limit(page_size)
        .offset(offset)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Notification::from)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        NotificationList { items },
        Some(Meta::new(page, page_size, total)),
    ))
}

pub async fn mark_read(
    state: &AppState,
    user: &AuthUser,
    id: i32,
) -> AppResult<ApiResponse<Notification>> {
    // Someone else's notification is reported as missing.
    let notification = Notifications::find_by_id(id)
        .filter(notifications::Column::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Notification"))?;

    if notification.read {
        return Ok(ApiResponse::success("OK", Notification::from(notification), None));
    }
    let mut active = notification.into_active_model();
    active.read = Set(true);
    let updated = active.update(&state.orm).await?;
    Ok(ApiResponse::success("OK", Notification::from(updated), None))
}

pub async fn mark_all_read(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<MarkAllReadResponse>> {
    let result = Notifications::update_many()
        .col_expr(notifications::Column::Read, Expr::value(true))
        .filter(notifications::Column::UserId.eq(user.user_id))
        .filter(notifications::Column::Read.eq(false))
        .exec(&state.orm)
        .await?;

    Ok(ApiResponse::success(
        "OK",
        MarkAllReadResponse {
            updated: result.rows_affected,
        },
        None,
    ))
}
