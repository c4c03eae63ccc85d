use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::{
    audit,
    dto::favorites::{FavoriteList, FavoriteRequest},
    entity::{Favorites, favorites},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Favorite,
    response::{Ack, ApiResponse, Meta},
    routes::params::FavoriteQuery,
    state::AppState,
};

fn same_target(user: &AuthUser, payload: &FavoriteRequest) -> Condition {
    Condition::all()
        .add(favorites::Column::BuyerId.eq(user.user_id))
        .add(favorites::Column::TargetType.eq(payload.target_type))
        .add(favorites::Column::TargetId.eq(payload.target_id))
}

/// Adding an existing favorite returns the stored row.
pub async fn add_favorite(
    state: &AppState,
    user: &AuthUser,
    payload: FavoriteRequest,
) -> AppResult<ApiResponse<Favorite>> {
    let existing = Favorites::find()
        .filter(same_target(user, &payload))
        .one(&state.orm)
        .await?;
    if let Some(favorite) = existing {
        return Ok(ApiResponse::success("Favorited", Favorite::from(favorite), None));
    }

    let inserted = favorites::ActiveModel {
        buyer_id: Set(user.user_id),
        target_type: Set(payload.target_type),
        target_id: Set(payload.target_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.orm)
    .await;

    let favorite = match inserted {
        Ok(favorite) => favorite,
        // Lost a race with an identical request; the unique index kept one row.
        Err(err) => match AppError::from(err) {
            AppError::Conflict(_) => Favorites::find()
                .filter(same_target(user, &payload))
                .one(&state.orm)
                .await?
                .ok_or_else(|| AppError::not_found("Favorite"))?,
            other => return Err(other),
        },
    };

    audit::record(
        &state.orm,
        Some(user.user_id),
        "favorite_add",
        "favorites",
        serde_json::json!({ "target_type": payload.target_type, "target_id": payload.target_id }),
    )
    .await;

    Ok(ApiResponse::success("Favorited", Favorite::from(favorite), None))
}

pub async fn remove_favorite(
    state: &AppState,
    user: &AuthUser,
    payload: FavoriteRequest,
) -> AppResult<ApiResponse<Ack>> {
    let result = Favorites::delete_many()
        .filter(same_target(user, &payload))
        .exec(&state.orm)
        .await?;

    if result.rows_affected > 0 {
        audit::record(
            &state.orm,
            Some(user.user_id),
            "favorite_remove",
            "favorites",
            serde_json::json!({ "target_type": payload.target_type, "target_id": payload.target_id }),
        )
        .await;
    }

    Ok(ApiResponse::success("Removed from favorites", Ack::ok(), None))
}

pub async fn list_favorites(
    state: &AppState,
    user: &AuthUser,
    query: FavoriteQuery,
) -> AppResult<ApiResponse<FavoriteList>> {
    let (page, page_size, offset) = query.pagination().normalize();

    let mut finder = Favorites::find().filter(favorites::Column::BuyerId.eq(user.user_id));
    if let Some(target_type) = query.target_type {
        finder = finder.filter(favorites::Column::TargetType.eq(target_type));
    }
    let finder = finder
        .order_by_desc(favorites::Column::CreatedAt)
        .order_by_desc(favorites::Column::Id);

    let total = finder.clone().count(&state.orm).await?;
    let items = finder
        .limit(page_size)
        .offset(offset)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Favorite::from)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        FavoriteList { items },
        Some(Meta::new(page, page_size, total)),
    ))
}
