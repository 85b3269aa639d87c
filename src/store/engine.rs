//! Safar Data Store
//!
//! Orchestrates the SQLite tables and the live channels:
//! - Write path: insert payload → stamp id/timestamps → SQLite → publish to channel
//! - Read path: SQLite query with ordering and limit
//!
//! The connection sits behind a `std::sync::Mutex` held for a single
//! statement at a time, never across an `.await`.

use crate::store::database::{Database, TableCounts};
use crate::store::error::{StoreError, StoreResult};
use crate::store::realtime::{Realtime, Subscription};
use crate::store::types::{
    Article, ChatMessage, FeedTopic, NewArticle, NewChatMessage, NewTopic, Row, RowEvent, Table,
};
use chrono::{Duration as ChronoDuration, Utc};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::{interval, Duration};

/// Configuration for the data store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding the database file; `None` keeps everything in memory
    pub data_dir: Option<PathBuf>,
    /// Events buffered per live channel before slow subscribers lag
    pub channel_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: Some(PathBuf::from("safar_data")),
            channel_capacity: 256,
        }
    }
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
            ..Default::default()
        }
    }

    /// Configuration for a throwaway in-memory store
    pub fn in_memory() -> Self {
        Self {
            data_dir: None,
            ..Default::default()
        }
    }
}

/// Store statistics
#[derive(Debug, Clone, Copy)]
pub struct StoreStats {
    pub counts: TableCounts,
    pub active_subscriptions: usize,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "articles={}, chat_messages={}, feed_topics={}, subscriptions={}",
            self.counts.articles,
            self.counts.chat_messages,
            self.counts.feed_topics,
            self.active_subscriptions
        )
    }
}

/// The Safar data service: relational tables plus insert notifications
pub struct DataStore {
    db: Mutex<Database>,
    realtime: Realtime,
    config: StoreConfig,
}

impl DataStore {
    /// Open the store described by `config`
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        let db = match &config.data_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                Database::open(dir)?
            }
            None => Database::open_in_memory()?,
        };

        let store = Self {
            db: Mutex::new(db),
            realtime: Realtime::new(config.channel_capacity),
            config,
        };

        tracing::info!(stats = %store.stats()?, "Data store opened");
        Ok(store)
    }

    /// Open an empty in-memory store
    pub fn in_memory() -> StoreResult<Self> {
        Self::open(StoreConfig::in_memory())
    }

    fn db(&self) -> StoreResult<MutexGuard<'_, Database>> {
        self.db
            .lock()
            .map_err(|e| StoreError::Lock(format!("Failed to acquire database lock: {}", e)))
    }

    /// Directory holding the database, if persisted
    pub fn data_dir(&self) -> Option<&Path> {
        self.config.data_dir.as_deref()
    }

    // ============================================
    // FEED TOPICS
    // ============================================

    /// Topics, newest first
    pub fn list_topics(&self, active_only: bool) -> StoreResult<Vec<FeedTopic>> {
        self.db()?.list_topics(active_only)
    }

    pub fn insert_topic(&self, new: &NewTopic) -> StoreResult<FeedTopic> {
        let topic = self.db()?.insert_topic(new, Utc::now())?;
        self.realtime
            .publish(RowEvent::insert(Row::FeedTopic(topic.clone())));
        Ok(topic)
    }

    /// Insert `seeds` when the topics table is still empty
    ///
    /// Seeds are written last-to-first so the newest-first listing shows them
    /// in the order given. Returns the number of topics inserted.
    pub fn seed_topics(&self, seeds: &[NewTopic]) -> StoreResult<usize> {
        let mut db = self.db()?;
        if db.counts()?.feed_topics > 0 {
            return Ok(0);
        }

        let base = Utc::now();
        for (i, seed) in seeds.iter().rev().enumerate() {
            db.insert_topic(seed, base + ChronoDuration::milliseconds(i as i64))?;
        }

        tracing::info!(count = seeds.len(), "Seeded feed topics");
        Ok(seeds.len())
    }

    // ============================================
    // ARTICLES
    // ============================================

    /// Articles, newest first
    pub fn list_articles(&self) -> StoreResult<Vec<Article>> {
        self.db()?.list_articles()
    }

    pub fn get_article(&self, id: &str) -> StoreResult<Article> {
        self.db()?.get_article(id)
    }

    /// Insert an article and notify `articles` subscribers
    pub fn insert_article(&self, new: &NewArticle) -> StoreResult<Article> {
        let article = self.db()?.insert_article(new, Utc::now())?;

        tracing::info!(
            article_id = %article.id,
            author_id = %article.author_id,
            internal = article.is_internal(),
            "Article created"
        );

        self.realtime
            .publish(RowEvent::insert(Row::Article(article.clone())));
        Ok(article)
    }

    // ============================================
    // CHAT MESSAGES
    // ============================================

    /// The most recent `limit` messages, oldest first
    pub fn recent_messages(&self, limit: usize) -> StoreResult<Vec<ChatMessage>> {
        self.db()?.recent_messages(limit)
    }

    /// Insert a chat message and notify `chat_messages` subscribers
    pub fn insert_message(&self, new: &NewChatMessage) -> StoreResult<ChatMessage> {
        let message = self.db()?.insert_message(new, Utc::now())?;

        tracing::debug!(
            message_id = %message.id,
            user_id = %message.user_id,
            "Chat message stored"
        );

        self.realtime
            .publish(RowEvent::insert(Row::ChatMessage(message.clone())));
        Ok(message)
    }

    /// Delete chat messages older than `days`
    pub fn purge_messages_older_than(&self, days: u32) -> StoreResult<usize> {
        let cutoff = Utc::now() - ChronoDuration::days(days as i64);
        let deleted = self.db()?.purge_messages_before(cutoff)?;
        if deleted > 0 {
            tracing::info!(deleted, retention_days = days, "Purged expired chat messages");
        }
        Ok(deleted)
    }

    // ============================================
    // LIVE CHANNELS
    // ============================================

    /// Listen for inserts into `table`
    pub fn subscribe(&self, table: Table) -> Subscription {
        self.realtime.subscribe(table)
    }

    pub fn realtime(&self) -> &Realtime {
        &self.realtime
    }

    /// Table sizes and live subscription count
    pub fn stats(&self) -> StoreResult<StoreStats> {
        Ok(StoreStats {
            counts: self.db()?.counts()?,
            active_subscriptions: self.realtime.active_subscriptions(),
        })
    }

    /// Start the chat retention sweep
    ///
    /// Returns `None` when `retention_days` is 0 (retention disabled).
    pub fn start_retention_sweep(
        self: &Arc<Self>,
        retention_days: u32,
        every: Duration,
    ) -> Option<tokio::task::JoinHandle<()>> {
        if retention_days == 0 {
            tracing::info!("Chat retention disabled");
            return None;
        }

        let store = Arc::clone(self);
        Some(tokio::spawn(async move {
            let mut ticker = interval(every);
            loop {
                ticker.tick().await;
                if let Err(e) = store.purge_messages_older_than(retention_days) {
                    tracing::error!("Retention sweep failed: {}", e);
                }
            }
        }))
    }
}
