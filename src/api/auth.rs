//! Session extractors
//!
//! `Authorization: Bearer <token>` resolved against the configured users.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::auth::AuthUser;

/// The caller's session, if a token was sent
///
/// A token that does not resolve is rejected rather than treated as anonymous.
pub struct CurrentUser(pub Option<AuthUser>);

/// A signed-in caller; rejects the request with 401 otherwise
pub struct RequireUser(pub AuthUser);

fn bearer_token(parts: &Parts) -> Result<Option<&str>, ApiError> {
    let Some(value) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Malformed authorization header".to_string()))?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(Some(token.trim())),
        _ => Err(ApiError::Unauthorized(
            "Expected a bearer token".to_string(),
        )),
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(parts)? {
            None => Ok(CurrentUser(None)),
            Some(token) => state
                .sessions
                .resolve(token)
                .cloned()
                .map(|user| CurrentUser(Some(user)))
                .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string())),
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for RequireUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        user.map(RequireUser)
            .ok_or_else(|| ApiError::Unauthorized("Please login first".to_string()))
    }
}
