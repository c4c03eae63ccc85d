use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    db,
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthData {
    /// `ok`, or `degraded` when the database does not answer
    pub status: String,
    pub uptime_secs: u64,
    pub database: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Pong {
    pub message: String,
}

pub fn api_router() -> Router<AppState> {
    Router::new().route("/ping", get(ping))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "OK", body = ApiResponse<HealthData>),
        (status = 503, description = "Database unreachable", body = ApiResponse<HealthData>),
    ),
    tag = "Health"
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<ApiResponse<HealthData>>) {
    let database = db::ping(&state.orm).await;
    let (code, status) = if database {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let data = HealthData {
        status: status.to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        database,
    };

    (
        code,
        Json(ApiResponse::success("Health check", data, Some(Meta::empty()))),
    )
}

#[utoipa::path(
    get,
    path = "/api/ping",
    responses((status = 200, description = "Liveness probe", body = Pong)),
    tag = "Health"
)]
pub async fn ping() -> Json<Pong> {
    Json(Pong {
        message: "pong".to_string(),
    })
}
