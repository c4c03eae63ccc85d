use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::metrics::Dashboard,
    error::AppResult,
    middleware::auth::AdminUser,
    response::ApiResponse,
    services::metrics_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard", get(dashboard))
}

#[utoipa::path(
    get,
    path = "/api/metrics/dashboard",
    responses(
        (status = 200, description = "Marketplace counters", body = ApiResponse<Dashboard>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Metrics"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> AppResult<Json<ApiResponse<Dashboard>>> {
    let resp = metrics_service::dashboard(&state, &admin).await?;
    Ok(Json(resp))
}
