use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::favorites::{FavoriteList, FavoriteRequest},
    error::AppResult,
    middleware::{auth::AuthUser, extract::{AppJson, AppQuery}},
    models::Favorite,
    response::{Ack, ApiResponse},
    routes::params::FavoriteQuery,
    services::favorite_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/",
        get(list_favorites).post(add_favorite).delete(remove_favorite),
    )
}

#[utoipa::path(
    post,
    path = "/api/favorites",
    request_body = FavoriteRequest,
    responses(
        (status = 201, description = "Favorited; repeating the call returns the same row", body = ApiResponse<Favorite>)
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn add_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<FavoriteRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Favorite>>)> {
    let resp = favorite_service::add_favorite(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    delete,
    path = "/api/favorites",
    request_body = FavoriteRequest,
    responses(
        (status = 200, description = "Removed from favorites", body = ApiResponse<Ack>)
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn remove_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<FavoriteRequest>,
) -> AppResult<Json<ApiResponse<Ack>>> {
    let resp = favorite_service::remove_favorite(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/favorites",
    params(FavoriteQuery),
    responses(
        (status = 200, description = "Favorites of the current user", body = ApiResponse<FavoriteList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn list_favorites(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(query): AppQuery<FavoriteQuery>,
) -> AppResult<Json<ApiResponse<FavoriteList>>> {
    let resp = favorite_service::list_favorites(&state, &user, query).await?;
    Ok(Json(resp))
}
