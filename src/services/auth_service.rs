use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

use crate::{
    audit,
    dto::auth::{AuthResponse, LoginRequest, MeResponse, RegisterRequest},
    entity::{Users, users},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Role, User},
    response::{ApiResponse, Meta},
    state::AppState,
    utils::{
        password::{hash_password, verify_password},
        token::{self, Claims},
    },
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn required(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn issue_token(state: &AppState, user: &users::Model) -> AppResult<String> {
    let claims = Claims::new(
        user.id,
        user.role,
        Some(&user.email),
        state.config.auth.jwt_expires_in,
    );
    token::sign(&claims, &state.config.auth.jwt_secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

// PBKDF2 is CPU bound; keep it off the async workers.
async fn hash_blocking(password: String, iterations: u32) -> AppResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password, iterations))
        .await
        .map_err(|e| AppError::Internal(e.into()))
}

async fn verify_blocking(password: String, stored: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| AppError::Internal(e.into()))
}

pub async fn register(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    let (Some(name), Some(email), Some(password)) = (
        required(payload.name),
        required(payload.email),
        payload.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::BadRequest(
            "name, email and password are required".into(),
        ));
    };

    let email = normalize_email(&email);
    if !email.contains('@') {
        return Err(AppError::BadRequest("Invalid email".into()));
    }

    let role = match payload.role.as_deref().map(str::trim) {
        None | Some("") => Role::Buyer,
        Some(raw) => match raw.parse::<Role>() {
            Ok(role @ (Role::Buyer | Role::Seller)) => role,
            _ => return Err(AppError::BadRequest("Invalid role".into())),
        },
    };

    let existing = Users::find()
        .filter(users::Column::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict("Email already in use".into()));
    }

    let password_hash = hash_blocking(password, state.config.auth.pbkdf2_iterations).await?;

    // The unique index still catches a concurrent registration that passed the check above.
    let user = users::ActiveModel {
        name: Set(name),
        email: Set(email),
        role: Set(role),
        password_hash: Set(Some(password_hash)),
        banned: Set(false),
        avatar: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.orm)
    .await
    .map_err(|err| match AppError::from(err) {
        AppError::Conflict(_) => AppError::Conflict("Email already in use".into()),
        other => other,
    })?;

    let token = issue_token(state, &user)?;

    audit::record(
        &state.orm,
        Some(user.id),
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id, "role": user.role }),
    )
    .await;

    Ok(ApiResponse::success(
        "User registered",
        AuthResponse {
            token,
            user: User::from(user),
        },
        None,
    ))
}

pub async fn login(state: &AppState, payload: LoginRequest) -> AppResult<ApiResponse<AuthResponse>> {
    let (Some(email), Some(password)) = (
        required(payload.email),
        payload.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::BadRequest("email and password are required".into()));
    };

    let user = Users::find()
        .filter(users::Column::Email.eq(normalize_email(&email)))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.into()))?;

    let Some(stored) = user.password_hash.clone() else {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    };
    if !verify_blocking(password, stored).await? {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }
    if user.banned {
        return Err(AppError::Forbidden("Account is banned".into()));
    }

    let token = issue_token(state, &user)?;

    audit::record(
        &state.orm,
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        AuthResponse {
            token,
            user: User::from(user),
        },
        Some(Meta::empty()),
    ))
}

pub fn me(user: &AuthUser) -> ApiResponse<MeResponse> {
    ApiResponse::success(
        "OK",
        MeResponse {
            id: user.user_id,
            role: user.role,
            email: user.email.clone(),
        },
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_email_case_and_whitespace() {
        assert_eq!(normalize_email("  Ana@Example.COM "), "ana@example.com");
    }

    #[test]
    fn blank_fields_count_as_missing() {
        assert_eq!(required(Some("   ".into())), None);
        assert_eq!(required(None), None);
        assert_eq!(required(Some(" Ana ".into())), Some("Ana".into()));
    }
}
