use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::{
    audit,
    dto::users::{UpdateUserRequest, UserList},
    entity::{Users, users},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_owner_or_admin},
    models::User,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::auth_service::normalize_email,
    state::AppState,
};

pub async fn list_users(
    state: &AppState,
    actor: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(actor)?;
    let (page, page_size, offset) = pagination.normalize();

    let finder = Users::find()
        .order_by_desc(users::Column::CreatedAt)
        .order_by_desc(users::Column::Id);
    let total = finder.clone().count(&state.orm).await?;
    let items = finder
        .limit(page_size)
        .offset(offset)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        UserList { items },
        Some(Meta::new(page, page_size, total)),
    ))
}

pub async fn get_user(state: &AppState, actor: &AuthUser, id: i32) -> AppResult<ApiResponse<User>> {
    ensure_owner_or_admin(actor, Some(id))?;
    let user = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(ApiResponse::success("OK", User::from(user), None))
}

pub async fn update_user(
    state: &AppState,
    actor: &AuthUser,
    id: i32,
    payload: UpdateUserRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_owner_or_admin(actor, Some(id))?;

    let name = payload.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
    let email = payload
        .email
        .map(|e| normalize_email(&e))
        .filter(|e| !e.is_empty());
    let avatar = payload.avatar.map(|a| a.trim().to_string());
    if name.is_none() && email.is_none() && avatar.is_none() {
        return Err(AppError::BadRequest("Nothing to update".into()));
    }

    let existing = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    if let Some(email) = &email {
        if !email.contains('@') {
            return Err(AppError::BadRequest("Invalid email".into()));
        }
        let taken = Users::find()
            .filter(users::Column::Email.eq(email.as_str()))
            .filter(users::Column::Id.ne(id))
            .one(&state.orm)
            .await?;
        if taken.is_some() {
            return Err(AppError::Conflict("Email already in use".into()));
        }
    }

    let mut active = existing.into_active_model();
    if let Some(name) = name {
        active.name = Set(name);
    }
    if let Some(email) = email {
        active.email = Set(email);
    }
    if let Some(avatar) = avatar {
        active.avatar = Set((!avatar.is_empty()).then_some(avatar));
    }
    let updated = active.update(&state.orm).await.map_err(|err| match AppError::from(err) {
        AppError::Conflict(_) => AppError::Conflict("Email already in use".into()),
        other => other,
    })?;

    audit::record(
        &state.orm,
        Some(actor.user_id),
        "user_update",
        "users",
        serde_json::json!({ "user_id": id }),
    )
    .await;

    Ok(ApiResponse::success("User updated", User::from(updated), None))
}
