//! Caller authentication from bearer token and claimed email

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::user::Email;

/// Header naming the account the bearer token was issued to
pub const AUTH_EMAIL_HEADER: &str = "x-auth-email";

/// Extractor for an authenticated caller
///
/// Requires `Authorization: Bearer <token>` and `X-Auth-Email: <email>`;
/// the pair must pass the configured credential verifier.
#[derive(Debug, Clone)]
pub struct Caller(pub Email);

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;
        let email = extract_claimed_email(&parts.headers)?;

        if !state.verifier.verify(&token, &email).await {
            debug!(email = %email, "Credential verification failed");
            return Err(ApiError::unauthorized("Invalid credentials"));
        }

        Ok(Caller(email))
    }
}

/// Extract the token from an `Authorization: Bearer` header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            ApiError::unauthorized(
                "Authentication required. Provide a token via 'Authorization: Bearer <token>'",
            )
        })
}

fn extract_claimed_email(headers: &HeaderMap) -> Result<Email, ApiError> {
    let raw = headers
        .get(AUTH_EMAIL_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing X-Auth-Email header"))?;

    Email::parse(raw).map_err(|_| ApiError::unauthorized("Invalid X-Auth-Email header"))
}
