//! # Safar
//!
//! Sapne Se Safar: a Shark Tank India companion service. Community articles,
//! a live chat room and read-only deal analytics, served over HTTP and
//! WebSocket.
//!
//! ## Modules
//!
//! - [`store`]: SQLite-backed tables with live insert channels
//! - [`service`]: the data service seam the view models call through
//! - [`feed`]: article submission and the feed page controller
//! - [`chat`]: the shared chat room, chat panel and preview
//! - [`analytics`]: deals dataset and the report aggregations
//! - [`api`]: REST API server with Axum
//! - [`client`]: the data service over a remote server's REST API
//! - [`websocket`]: live channel subscriptions for remote clients
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use safar::feed::{ArticleDraft, FeedController};
//! use safar::{AuthUser, DataStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(DataStore::in_memory()?);
//!     let mut feed = FeedController::new(store);
//!     feed.load().await?;
//!
//!     let user = AuthUser::new("u1", "asha@example.com").full_name("Asha");
//!     let mut draft = ArticleDraft::write("Season 3 recap", "Five deals closed on day one.");
//!     let article = feed.submit(Some(&user), &mut draft).await?;
//!
//!     println!("Published {} by {}", article.title, article.author_name);
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod api;
pub mod auth;
pub mod chat;
pub mod client;
pub mod config;
pub mod feed;
pub mod logging;
pub mod service;
pub mod store;
pub mod websocket;

// Re-export top-level types for convenience
pub use store::{
    Article, ArticleContent, ArticleLink, ChatMessage, DataStore, FeedTopic, StoreConfig,
    StoreError, StoreResult, Subscription, Table,
};

pub use auth::{AuthUser, SessionRegistry};

pub use service::DataService;

pub use feed::{ArticleDraft, ArticleMode, FeedController, FeedError};

pub use chat::{ChatError, ChatPanel, ChatPreview, ChatRoom};

pub use client::ApiClient;

pub use analytics::{Dataset, DatasetError, Report, SeasonFilter};

pub use api::{build_router, serve, ApiError, AppState};

pub use websocket::{ClientMessage, ConnectionHub, HubConfig, HubError, ServerMessage};

pub use config::{Config, ConfigError, LoggingConfig};
