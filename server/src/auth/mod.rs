//! Bearer token authentication for writes.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::AppError;
use crate::AppState;

/// Proof that the request may write to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Writer {
    /// No secret is configured
    Anonymous,
    /// The request presented the configured secret
    Authenticated,
}

impl FromRequestParts<AppState> for Writer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        authorize(header, state.config.auth_secret.as_deref())
    }
}

/// Check an `Authorization` header value against the configured secret.
pub fn authorize(header: Option<&str>, secret: Option<&str>) -> Result<Writer, AppError> {
    let Some(secret) = secret else {
        return Ok(Writer::Anonymous);
    };

    match header {
        Some(value) => match value.strip_prefix("Bearer ") {
            Some(token) if constant_time_eq(token.as_bytes(), secret.as_bytes()) => {
                Ok(Writer::Authenticated)
            }
            Some(_) => Err(AppError::Unauthorized("Invalid bearer token")),
            None => Err(AppError::Unauthorized("Invalid authorization header format")),
        },
        None => Err(AppError::Unauthorized("Missing authorization header")),
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
