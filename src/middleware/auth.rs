use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};

use crate::{
    error::AppError,
    models::Role,
    state::AppState,
    utils::token::{self, TokenError},
};

/// The authenticated principal decoded from a bearer token.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: i32,
    pub role: Role,
    pub email: Option<String>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// An [`AuthUser`] whose role is admin.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

pub fn ensure_role(user: &AuthUser, roles: &[Role]) -> Result<(), AppError> {
    if !roles.contains(&user.role) {
        return Err(AppError::forbidden());
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, &[Role::Admin])
}

/// Allows admins, and anyone whose id matches the resource owner.
/// A resource without an owner is admin-only.
pub fn ensure_owner_or_admin(user: &AuthUser, owner_id: Option<i32>) -> Result<(), AppError> {
    if user.is_admin() || owner_id == Some(user.user_id) {
        return Ok(());
    }
    Err(AppError::forbidden())
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let token = bearer_token(parts).ok_or_else(|| AppError::Unauthorized("Missing token".into()))?;

        let claims = token::verify(token, &state.config.auth.jwt_secret).map_err(|err| match err {
            TokenError::Expired => AppError::Unauthorized("Token expired".into()),
            TokenError::Invalid => AppError::Unauthorized("Invalid token".into()),
        })?;

        let user_id = claims
            .sub
            .parse::<i32>()
            .map_err(|_| AppError::Unauthorized("Invalid token".into()))?;

        Ok(AuthUser {
            user_id,
            role: claims.role,
            email: claims.email,
        })
    }
}

impl<S> FromRequestParts<S> for AdminUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        ensure_admin(&user)?;
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn user(id: i32, role: Role) -> AuthUser {
        AuthUser {
            user_id: id,
            role,
            email: None,
        }
    }

    fn parts_with(header_value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header_value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn owner_or_admin_policy() {
        assert!(ensure_owner_or_admin(&user(7, Role::Seller), Some(7)).is_ok());
        assert!(ensure_owner_or_admin(&user(1, Role::Admin), Some(7)).is_ok());
        assert!(ensure_owner_or_admin(&user(1, Role::Admin), None).is_ok());
        assert!(matches!(
            ensure_owner_or_admin(&user(8, Role::Seller), Some(7)),
            Err(AppError::Forbidden(_))
        ));
        assert!(ensure_owner_or_admin(&user(8, Role::Seller), None).is_err());
    }

    #[test]
    fn role_gate() {
        assert!(ensure_role(&user(1, Role::Seller), &[Role::Seller, Role::Admin]).is_ok());
        assert!(ensure_role(&user(1, Role::Buyer), &[Role::Seller, Role::Admin]).is_err());
        assert!(ensure_admin(&user(1, Role::Seller)).is_err());
    }

    #[test]
    fn extracts_bearer_tokens() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc.def"))), Some("abc.def"));
        assert_eq!(bearer_token(&parts_with(Some("bearer  abc "))), Some("abc"));
        assert_eq!(bearer_token(&parts_with(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&parts_with(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts_with(None)), None);
    }
}
