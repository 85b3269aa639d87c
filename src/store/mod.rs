//! Safar Data Service
//!
//! The relational store behind the feed and chat:
//!
//! - **types**: Records (Article, FeedTopic, ChatMessage) and insert events
//! - **database**: SQLite tables with ordering, limit and filter queries
//! - **realtime**: Per-table live channels and RAII subscriptions
//! - **engine**: `DataStore`, tying the tables and channels together
//! - **error**: Error types
//!
//! # Architecture
//!
//! ```text
//! Write Path:
//!   NewArticle / NewChatMessage → stamp id + created_at → SQLite → Realtime channel
//!
//! Read Path:
//!   Query → SQLite (ORDER BY created_at, seq) → Records
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use safar::store::{DataStore, NewChatMessage, Table};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = DataStore::in_memory()?;
//!     let mut live = store.subscribe(Table::ChatMessages);
//!
//!     store.insert_message(&NewChatMessage {
//!         user_id: "u1".into(),
//!         user_name: "Asha".into(),
//!         message: "Namaste sharks!".into(),
//!     })?;
//!
//!     let event = live.recv().await?;
//!     println!("{:?}", event.record);
//!     Ok(())
//! }
//! ```

pub mod database;
pub mod engine;
pub mod error;
pub mod realtime;
pub mod types;

pub use database::{Database, TableCounts};
pub use engine::{DataStore, StoreConfig, StoreStats};
pub use error::{StoreError, StoreResult};
pub use realtime::{Realtime, Subscription, SubscriptionError};
pub use types::{
    Article, ArticleContent, ArticleLink, ChatMessage, FeedTopic, NewArticle, NewChatMessage,
    NewTopic, Row, RowEvent, Table, INTERNAL_ARTICLE_PREFIX, INTERNAL_SCHEME,
};
