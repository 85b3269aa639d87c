//! Chat Routes
//!
//! - GET /api/v1/chat/messages?limit= - Recent history, oldest first
//! - POST /api/v1/chat/messages - Send a message
//!
//! Both require a session. Live delivery goes through the `/ws` socket.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::auth::RequireUser;
use crate::api::dto::{MessageListResponse, MessagesQuery, SendMessageRequest};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::chat::compose_message;
use crate::store::ChatMessage;

/// Largest history page a client may ask for
pub const MAX_HISTORY_LIMIT: usize = 500;

/// GET /api/v1/chat/messages
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    RequireUser(_user): RequireUser,
    Query(query): Query<MessagesQuery>,
) -> ApiResult<Json<MessageListResponse>> {
    let limit = query.limit.unwrap_or(state.chat.history_limit);
    if limit == 0 {
        return Err(ApiError::Validation("limit must be at least 1".to_string()));
    }

    let messages = state.store.recent_messages(limit.min(MAX_HISTORY_LIMIT))?;
    let total = messages.len();
    Ok(Json(MessageListResponse { messages, total }))
}

/// POST /api/v1/chat/messages
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    RequireUser(user): RequireUser,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<(StatusCode, Json<ChatMessage>)> {
    let new = compose_message(&user, &req.message)?;
    let stored = state.store.insert_message(&new)?;
    Ok((StatusCode::CREATED, Json(stored)))
}
