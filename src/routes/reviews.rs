use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dto::reviews::{CreateReviewRequest, ReplyReviewRequest, ReviewList, ReviewSummary},
    error::AppResult,
    middleware::{auth::AuthUser, extract::{AppJson, AppPath, AppQuery}},
    models::Review,
    response::ApiResponse,
    routes::params::{ReviewQuery, ReviewTargetQuery},
    services::review_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reviews).post(create_review))
        .route("/summary", get(review_summary))
        .route("/{id}/reply", post(reply_review))
}

#[utoipa::path(
    post,
    path = "/api/reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ApiResponse<Review>),
        (status = 400, description = "Invalid rating or target"),
        (status = 404, description = "Target not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn create_review(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateReviewRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Review>>)> {
    let resp = review_service::create_review(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/reviews",
    params(ReviewQuery),
    responses(
        (status = 200, description = "Reviews of a product or seller", body = ApiResponse<ReviewList>)
    ),
    tag = "Reviews"
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ReviewQuery>,
) -> AppResult<Json<ApiResponse<ReviewList>>> {
    let resp = review_service::list_reviews(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/reviews/summary",
    params(ReviewTargetQuery),
    responses(
        (status = 200, description = "Review count and average rating", body = ApiResponse<ReviewSummary>)
    ),
    tag = "Reviews"
)]
pub async fn review_summary(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ReviewTargetQuery>,
) -> AppResult<Json<ApiResponse<ReviewSummary>>> {
    let resp = review_service::summary(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/reviews/{id}/reply",
    params(("id" = i32, Path, description = "Review ID")),
    request_body = ReplyReviewRequest,
    responses(
        (status = 200, description = "Reply stored", body = ApiResponse<Review>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Review not found"),
        (status = 409, description = "Review already has a reply"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn reply_review(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<ReplyReviewRequest>,
) -> AppResult<Json<ApiResponse<Review>>> {
    let resp = review_service::reply(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
