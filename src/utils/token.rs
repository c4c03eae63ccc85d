use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::models::Role;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: i32, role: Role, email: Option<&str>, ttl: Duration) -> Self {
        let iat = Utc::now().timestamp();
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX / 2);
        Self {
            sub: user_id.to_string(),
            role,
            email: email.map(str::to_string),
            iat,
            exp: iat.saturating_add(ttl),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    Expired,
    Invalid,
}

pub fn sign(claims: &Claims, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|err| match err.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn round_trips_subject_and_role() {
        let claims = Claims::new(42, Role::Seller, Some("s@x.io"), Duration::from_secs(3600));
        let token = sign(&claims, SECRET).unwrap();
        let decoded = verify(&token, SECRET).unwrap();
        assert_eq!(decoded, claims);
        assert_eq!(decoded.sub, "42");
        assert_eq!(decoded.exp - decoded.iat, 3600);
    }

    #[test]
    fn rejects_wrong_secret_and_garbage() {
        let token = sign(&Claims::new(1, Role::Buyer, None, Duration::from_secs(60)), SECRET).unwrap();
        assert_eq!(verify(&token, "other"), Err(TokenError::Invalid));
        assert_eq!(verify("not.a.jwt", SECRET), Err(TokenError::Invalid));
        assert_eq!(verify("", SECRET), Err(TokenError::Invalid));
    }

    #[test]
    fn reports_expiry_separately() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "1".into(),
            role: Role::Buyer,
            email: None,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = sign(&claims, SECRET).unwrap();
        assert_eq!(verify(&token, SECRET), Err(TokenError::Expired));
    }
}
