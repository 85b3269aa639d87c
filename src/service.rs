//! Data service boundary
//!
//! The feed and chat view models talk to the data service only through
//! [`DataService`]. [`DataStore`] implements it in-process; tests swap in
//! doubles that count calls or inject failures.

use async_trait::async_trait;

use crate::store::{
    Article, ChatMessage, DataStore, FeedTopic, NewArticle, NewChatMessage, StoreResult,
    Subscription, Table,
};

/// Operations the view models need from the data service
#[async_trait]
pub trait DataService: Send + Sync {
    /// Active topics, newest first
    async fn list_topics(&self) -> StoreResult<Vec<FeedTopic>>;

    /// All articles, newest first
    async fn list_articles(&self) -> StoreResult<Vec<Article>>;

    /// Insert an article, returning the stored record
    async fn create_article(&self, new: NewArticle) -> StoreResult<Article>;

    /// The most recent `limit` chat messages, oldest first
    async fn recent_messages(&self, limit: usize) -> StoreResult<Vec<ChatMessage>>;

    /// Insert a chat message, returning the stored record
    async fn send_message(&self, new: NewChatMessage) -> StoreResult<ChatMessage>;

    /// Open a live subscription to inserts into `table`
    fn subscribe(&self, table: Table) -> Subscription;
}

#[async_trait]
impl DataService for DataStore {
    async fn list_topics(&self) -> StoreResult<Vec<FeedTopic>> {
        DataStore::list_topics(self, true)
    }

    async fn list_articles(&self) -> StoreResult<Vec<Article>> {
        DataStore::list_articles(self)
    }

    async fn create_article(&self, new: NewArticle) -> StoreResult<Article> {
        self.insert_article(&new)
    }

    async fn recent_messages(&self, limit: usize) -> StoreResult<Vec<ChatMessage>> {
        DataStore::recent_messages(self, limit)
    }

    async fn send_message(&self, new: NewChatMessage) -> StoreResult<ChatMessage> {
        self.insert_message(&new)
    }

    fn subscribe(&self, table: Table) -> Subscription {
        DataStore::subscribe(self, table)
    }
}

/// Test doubles shared by the feed and chat tests
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::store::StoreError;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Wraps a real in-memory store, counting remote calls and optionally failing them
    pub struct CountingService {
        pub store: DataStore,
        pub calls: AtomicUsize,
        pub fail: AtomicBool,
    }

    impl CountingService {
        pub fn new() -> Self {
            Self {
                store: DataStore::in_memory().unwrap(),
                calls: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn set_failing(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }

        fn record(&self) -> StoreResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(StoreError::Database("service unavailable".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl DataService for CountingService {
        async fn list_topics(&self) -> StoreResult<Vec<FeedTopic>> {
            self.record()?;
            self.store.list_topics(true)
        }

        async fn list_articles(&self) -> StoreResult<Vec<Article>> {
            self.record()?;
            self.store.list_articles()
        }

        async fn create_article(&self, new: NewArticle) -> StoreResult<Article> {
            self.record()?;
            self.store.insert_article(&new)
        }

        async fn recent_messages(&self, limit: usize) -> StoreResult<Vec<ChatMessage>> {
            self.record()?;
            self.store.recent_messages(limit)
        }

        async fn send_message(&self, new: NewChatMessage) -> StoreResult<ChatMessage> {
            self.record()?;
            self.store.insert_message(&new)
        }

        fn subscribe(&self, table: Table) -> Subscription {
            self.store.subscribe(table)
        }
    }
}
