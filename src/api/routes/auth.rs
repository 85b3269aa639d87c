//! Session Routes
//!
//! - GET /api/v1/auth/me - The profile behind the bearer token

use axum::Json;

use crate::api::auth::RequireUser;
use crate::auth::AuthUser;

/// GET /api/v1/auth/me
pub async fn me(RequireUser(user): RequireUser) -> Json<AuthUser> {
    Json(user)
}
