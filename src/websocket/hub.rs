//! WebSocket Connection Hub
//!
//! Tracks connections and their channel subscriptions. Each subscribed
//! channel is a task forwarding one store [`Subscription`] into the
//! connection's outbound queue; unsubscribing or disconnecting aborts the
//! task, which releases the subscription.
//!
//! [`Subscription`]: crate::store::Subscription

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::messages::ServerMessage;
use crate::auth::AuthUser;
use crate::store::{DataStore, SubscriptionError, Table};

/// Unique identifier for a WebSocket connection
pub type ConnectionId = String;

/// Manages all WebSocket connections and subscriptions
pub struct ConnectionHub {
    /// Active connections: ConnectionId → ConnectionHandle
    connections: Arc<RwLock<HashMap<ConnectionId, ConnectionHandle>>>,
    store: Arc<DataStore>,
    config: HubConfig,
}

/// Configuration for the connection hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum number of concurrent connections
    pub max_connections: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: 1000,
        }
    }
}

/// Per-connection state
pub struct ConnectionHandle {
    /// Outbound queue for this connection
    pub sender: mpsc::UnboundedSender<ServerMessage>,
    /// Session the socket was opened with
    pub user: Option<AuthUser>,
    /// One forwarding task per subscribed channel
    forwards: HashMap<Table, JoinHandle<()>>,
}

impl ConnectionHub {
    pub fn new(config: HubConfig, store: Arc<DataStore>) -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            store,
            config,
        }
    }

    /// Register a new WebSocket connection
    ///
    /// Returns the connection ID on success, or an error if the connection
    /// limit has been reached.
    pub async fn register(
        &self,
        sender: mpsc::UnboundedSender<ServerMessage>,
        user: Option<AuthUser>,
    ) -> Result<ConnectionId, HubError> {
        let mut connections = self.connections.write().await;
        if connections.len() >= self.config.max_connections {
            return Err(HubError::TooManyConnections(self.config.max_connections));
        }

        let id = Uuid::new_v4().to_string();
        let user_id = user.as_ref().map(|u| u.id.clone());
        connections.insert(
            id.clone(),
            ConnectionHandle {
                sender,
                user,
                forwards: HashMap::new(),
            },
        );

        tracing::info!(connection_id = %id, user_id = ?user_id, "WebSocket connected");
        Ok(id)
    }

    /// Unregister a connection and release its subscriptions
    pub async fn unregister(&self, id: &str) {
        let handle = self.connections.write().await.remove(id);

        if let Some(handle) = handle {
            stop_forwards(handle.forwards.into_values()).await;
        }

        tracing::info!(connection_id = %id, "WebSocket disconnected");
    }

    /// Subscribe a connection to channels
    ///
    /// The whole request is rejected if any channel is unknown or needs a
    /// session the socket lacks. Channels already subscribed are confirmed
    /// again without a second subscription.
    pub async fn subscribe(&self, id: &str, channels: &[String]) -> Result<Vec<Table>, HubError> {
        let mut connections = self.connections.write().await;
        let handle = connections.get_mut(id).ok_or(HubError::ConnectionNotFound)?;

        let mut tables = Vec::with_capacity(channels.len());
        for channel in channels {
            let table: Table = channel
                .parse()
                .map_err(|_| HubError::UnknownChannel(channel.clone()))?;
            if requires_session(table) && handle.user.is_none() {
                return Err(HubError::Unauthorized(table));
            }
            if !tables.contains(&table) {
                tables.push(table);
            }
        }

        for table in &tables {
            if !handle.forwards.contains_key(table) {
                let task = self.forward(id, *table, handle.sender.clone());
                handle.forwards.insert(*table, task);
            }
        }

        tracing::debug!(connection_id = %id, channels = ?tables, "Subscribed to channels");
        Ok(tables)
    }

    /// Unsubscribe a connection from channels
    ///
    /// Returns the channels that were actually subscribed.
    pub async fn unsubscribe(&self, id: &str, channels: &[String]) -> Result<Vec<Table>, HubError> {
        let stopped: Vec<(Table, JoinHandle<()>)> = {
            let mut connections = self.connections.write().await;
            let handle = connections.get_mut(id).ok_or(HubError::ConnectionNotFound)?;

            channels
                .iter()
                .filter_map(|c| c.parse::<Table>().ok())
                .filter_map(|t| handle.forwards.remove(&t).map(|task| (t, task)))
                .collect()
        };

        let tables: Vec<Table> = stopped.iter().map(|(t, _)| *t).collect();
        stop_forwards(stopped.into_iter().map(|(_, task)| task)).await;

        tracing::debug!(connection_id = %id, channels = ?tables, "Unsubscribed from channels");
        Ok(tables)
    }

    /// Send a message directly to a specific connection
    pub async fn send_to(&self, id: &str, message: ServerMessage) -> Result<(), HubError> {
        let connections = self.connections.read().await;
        let handle = connections.get(id).ok_or(HubError::ConnectionNotFound)?;

        handle
            .sender
            .send(message)
            .map_err(|_| HubError::SendFailed)
    }

    /// Get the current connection count
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Connections subscribed to a channel
    pub async fn subscription_count(&self, table: Table) -> usize {
        self.connections
            .read()
            .await
            .values()
            .filter(|h| h.forwards.contains_key(&table))
            .count()
    }

    fn forward(
        &self,
        id: &str,
        table: Table,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) -> JoinHandle<()> {
        // Subscribe before returning so inserts after the ack are never missed
        let mut subscription = self.store.subscribe(table);
        let connection_id = id.to_string();

        tokio::spawn(async move {
            loop {
                let message = match subscription.recv().await {
                    Ok(event) => ServerMessage::from(event),
                    Err(SubscriptionError::Lagged(missed)) => {
                        tracing::warn!(
                            connection_id = %connection_id,
                            channel = %table,
                            missed,
                            "WebSocket subscriber lagged"
                        );
                        ServerMessage::Error {
                            message: format!("Missed {} inserts on {}", missed, table),
                        }
                    }
                    Err(SubscriptionError::Closed) => break,
                };

                if sender.send(message).is_err() {
                    break;
                }
            }
        })
    }
}

fn requires_session(table: Table) -> bool {
    matches!(table, Table::ChatMessages)
}

async fn stop_forwards(tasks: impl IntoIterator<Item = JoinHandle<()>>) {
    for task in tasks {
        task.abort();
        // Resolves once the task (and its subscription) is dropped
        let _ = task.await;
    }
}

/// Errors that can occur in the connection hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections (limit: {0})")]
    TooManyConnections(usize),

    #[error("Connection not found")]
    ConnectionNotFound,

    #[error("Failed to send message")]
    SendFailed,

    #[error("Please login to subscribe to {0}")]
    Unauthorized(Table),

    #[error("Unknown channel: {0}")]
    UnknownChannel(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ArticleLink, NewArticle, NewChatMessage, Row};

    fn hub() -> (ConnectionHub, Arc<DataStore>) {
        let store = Arc::new(DataStore::in_memory().unwrap());
        (
            ConnectionHub::new(HubConfig::default(), Arc::clone(&store)),
            store,
        )
    }

    fn user() -> AuthUser {
        AuthUser::new("u1", "asha@example.com")
    }

    fn channels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_config() {
        assert_eq!(HubConfig::default().max_connections, 1000);
    }

    #[tokio::test]
    async fn test_register_unregister() {
        let (hub, _store) = hub();
        let (tx, _rx) = mpsc::unbounded_channel();

        let id = hub.register(tx, None).await.unwrap();
        assert_eq!(hub.connection_count().await, 1);

        hub.unregister(&id).await;
        assert_eq!(hub.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_connection_limit() {
        let store = Arc::new(DataStore::in_memory().unwrap());
        let hub = ConnectionHub::new(HubConfig { max_connections: 2 }, store);

        let (tx1, _) = mpsc::unbounded_channel();
        let (tx2, _) = mpsc::unbounded_channel();
        let (tx3, _) = mpsc::unbounded_channel();

        let id1 = hub.register(tx1, None).await.unwrap();
        let id2 = hub.register(tx2, None).await.unwrap();
        let result = hub.register(tx3, None).await;

        assert!(matches!(result, Err(HubError::TooManyConnections(2))));

        hub.unregister(&id1).await;
        hub.unregister(&id2).await;
    }

    #[tokio::test]
    async fn test_subscribe_unsubscribe_bookkeeping() {
        let (hub, store) = hub();
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = hub.register(tx, None).await.unwrap();

        let subscribed = hub
            .subscribe(&id, &channels(&["articles", "articles"]))
            .await
            .unwrap();
        assert_eq!(subscribed, vec![Table::Articles]);
        assert_eq!(hub.subscription_count(Table::Articles).await, 1);
        assert_eq!(store.realtime().active_subscriptions(), 1);

        // Subscribing again does not stack
        hub.subscribe(&id, &channels(&["articles"])).await.unwrap();
        assert_eq!(store.realtime().active_subscriptions(), 1);

        let unsubscribed = hub
            .unsubscribe(&id, &channels(&["articles", "feed_topics"]))
            .await
            .unwrap();
        assert_eq!(unsubscribed, vec![Table::Articles]);
        assert_eq!(hub.subscription_count(Table::Articles).await, 0);
        assert_eq!(store.realtime().active_subscriptions(), 0);

        hub.unregister(&id).await;
    }

    #[tokio::test]
    async fn test_unregister_releases_subscriptions() {
        let (hub, store) = hub();
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = hub.register(tx, Some(user())).await.unwrap();

        hub.subscribe(&id, &channels(&["articles", "chat_messages"]))
            .await
            .unwrap();
        assert_eq!(store.realtime().active_subscriptions(), 2);

        hub.unregister(&id).await;
        assert_eq!(store.realtime().active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_chat_requires_session() {
        let (hub, store) = hub();
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = hub.register(tx, None).await.unwrap();

        let result = hub
            .subscribe(&id, &channels(&["articles", "chat_messages"]))
            .await;

        assert!(matches!(result, Err(HubError::Unauthorized(Table::ChatMessages))));
        assert_eq!(store.realtime().active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_unknown_channel() {
        let (hub, _store) = hub();
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = hub.register(tx, None).await.unwrap();

        let result = hub.subscribe(&id, &channels(&["metrics"])).await;
        assert!(matches!(result, Err(HubError::UnknownChannel(c)) if c == "metrics"));
    }

    #[tokio::test]
    async fn test_inserts_reach_subscribers_only() {
        let (hub, store) = hub();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        let id1 = hub.register(tx1, Some(user())).await.unwrap();
        let id2 = hub.register(tx2, None).await.unwrap();
        hub.subscribe(&id1, &channels(&["chat_messages"])).await.unwrap();
        hub.subscribe(&id2, &channels(&["articles"])).await.unwrap();

        let stored = store
            .insert_message(&NewChatMessage {
                user_id: "u1".to_string(),
                user_name: "Asha".to_string(),
                message: "hello".to_string(),
            })
            .unwrap();

        match rx1.recv().await {
            Some(ServerMessage::Insert { channel, record }) => {
                assert_eq!(channel, Table::ChatMessages);
                assert_eq!(record, Row::ChatMessage(stored));
            }
            other => panic!("Expected Insert, got {:?}", other),
        }

        store
            .insert_article(&NewArticle {
                title: "Recap".to_string(),
                description: None,
                link: ArticleLink::External("https://example.com".to_string()),
                author_id: "u1".to_string(),
                author_name: "Asha".to_string(),
            })
            .unwrap();

        assert!(matches!(
            rx2.recv().await,
            Some(ServerMessage::Insert {
                channel: Table::Articles,
                ..
            })
        ));
        assert!(rx1.try_recv().is_err());

        hub.unregister(&id1).await;
        hub.unregister(&id2).await;
    }

    #[tokio::test]
    async fn test_send_to_unknown_connection() {
        let (hub, _store) = hub();
        assert!(matches!(
            hub.send_to("missing", ServerMessage::Pong).await,
            Err(HubError::ConnectionNotFound)
        ));
    }
}
