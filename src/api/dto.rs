//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use serde::{Deserialize, Serialize};

use crate::store::{Article, ArticleContent, ChatMessage, FeedTopic};

// ============================================
// FEED DTOs
// ============================================

/// Topic list response
#[derive(Debug, Serialize, Deserialize)]
pub struct TopicListResponse {
    pub topics: Vec<FeedTopic>,
    pub total: usize,
}

/// Article list response
#[derive(Debug, Serialize, Deserialize)]
pub struct ArticleListResponse {
    pub articles: Vec<Article>,
    pub total: usize,
}

/// Single article with its resolved content
#[derive(Debug, Serialize, Deserialize)]
pub struct ArticleResponse {
    pub article: Article,
    /// Where to read it: an external URL, or the inline body
    pub content: ArticleContent,
}

// ============================================
// CHAT DTOs
// ============================================

/// `GET /chat/messages` query
#[derive(Debug, Default, Deserialize)]
pub struct MessagesQuery {
    /// Defaults to the configured history limit
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Chat history, oldest first
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageListResponse {
    pub messages: Vec<ChatMessage>,
    pub total: usize,
}

/// Send message request
#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

// ============================================
// ANALYTICS DTOs
// ============================================

/// Season selector query
#[derive(Debug, Default, Deserialize)]
pub struct SeasonQuery {
    #[serde(default)]
    pub season: Option<u32>,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health status
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy" or "unhealthy"
    pub status: String,
    /// Store status: "ok" or "error"
    pub store: String,
    pub deals_loaded: usize,
    pub ws_connections: usize,
    pub active_subscriptions: usize,
    pub uptime_seconds: u64,
    pub version: String,
}
