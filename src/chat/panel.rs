//! Chat sidebar state machine
//!
//! Closed: no subscription, no data. Open: subscribed to `chat_messages`
//! with the recent history loaded into the room.

use std::sync::Arc;

use super::room::{ChatPreview, ChatRoom};
use super::ChatError;
use crate::auth::AuthUser;
use crate::service::DataService;
use crate::store::{ChatMessage, NewChatMessage, Row, Subscription, SubscriptionError, Table};

/// Messages loaded when the panel opens
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

const LOGIN_TO_SEND: &str = "Please login to send messages";
const LOGIN_TO_CHAT: &str = "Please login to join the chat";

enum PanelState {
    Closed,
    Open { subscription: Subscription },
}

/// Build the insert payload for `text`, stamped with the sender's identity
///
/// The text is trimmed; blank text is rejected.
pub fn compose_message(user: &AuthUser, text: &str) -> Result<NewChatMessage, ChatError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ChatError::EmptyMessage);
    }

    Ok(NewChatMessage {
        user_id: user.id.clone(),
        user_name: user.display_name().to_string(),
        message: text.to_string(),
    })
}

/// The chat sidebar
pub struct ChatPanel<S: DataService + ?Sized> {
    service: Arc<S>,
    room: ChatRoom,
    state: PanelState,
    history_limit: usize,
}

impl<S: DataService + ?Sized> ChatPanel<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self::with_history_limit(service, DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_history_limit(service: Arc<S>, history_limit: usize) -> Self {
        Self {
            service,
            room: ChatRoom::new(),
            state: PanelState::Closed,
            history_limit,
        }
    }

    /// Open the panel
    ///
    /// Subscribes before fetching so an insert landing between the two is
    /// still delivered. The panel only becomes Open once every fetch,
    /// including a lag resync, has succeeded; otherwise the subscription is
    /// dropped and the room cleared.
    pub async fn open(&mut self, session: Option<&AuthUser>) -> Result<(), ChatError> {
        let user = session.ok_or(ChatError::LoginRequired(LOGIN_TO_CHAT))?;
        if self.is_open() {
            return Ok(());
        }

        let mut subscription = self.service.subscribe(Table::ChatMessages);

        let history = match self.service.recent_messages(self.history_limit).await {
            Ok(history) => history,
            Err(e) => {
                tracing::error!(error = %e, user_id = %user.id, "Error fetching messages");
                return Err(e.into());
            }
        };
        self.room.replace(history);

        // Inserts that raced the fetch
        let mut resync = false;
        loop {
            match subscription.try_recv() {
                Ok(Some(event)) => self.apply(event.record),
                Ok(None) => break,
                Err(SubscriptionError::Lagged(_)) => resync = true,
                Err(SubscriptionError::Closed) => break,
            }
        }

        if resync {
            if let Err(e) = self.resync().await {
                self.room.clear();
                return Err(e);
            }
        }

        self.state = PanelState::Open { subscription };
        tracing::debug!(user_id = %user.id, messages = self.room.len(), "Chat opened");
        Ok(())
    }

    /// Close the panel, releasing the subscription and clearing the data
    pub fn close(&mut self) {
        if let PanelState::Open { .. } = std::mem::replace(&mut self.state, PanelState::Closed) {
            tracing::debug!("Chat closed");
        }
        self.room.clear();
    }

    /// Apply every buffered insert without waiting
    ///
    /// Returns the number of messages added to the room.
    pub async fn pump(&mut self) -> Result<usize, ChatError> {
        let before = self.room.len();
        let mut resync = false;

        if let PanelState::Open { subscription } = &mut self.state {
            loop {
                match subscription.try_recv() {
                    Ok(Some(event)) => {
                        if let Row::ChatMessage(message) = event.record {
                            self.room.insert(message);
                        }
                    }
                    Ok(None) => break,
                    Err(SubscriptionError::Lagged(missed)) => {
                        tracing::warn!(missed, "Chat subscription lagged");
                        resync = true;
                    }
                    Err(SubscriptionError::Closed) => break,
                }
            }
        }

        if resync {
            self.resync().await?;
        }
        Ok(self.room.len() - before)
    }

    /// Wait for the next new message and add it to the room
    ///
    /// Returns `None` when the panel is closed or the channel has shut down.
    pub async fn next_message(&mut self) -> Result<Option<ChatMessage>, ChatError> {
        loop {
            let PanelState::Open { subscription } = &mut self.state else {
                return Ok(None);
            };

            match subscription.recv().await {
                Ok(event) => {
                    if let Row::ChatMessage(message) = event.record {
                        if self.room.insert(message.clone()) {
                            return Ok(Some(message));
                        }
                    }
                }
                Err(SubscriptionError::Lagged(missed)) => {
                    tracing::warn!(missed, "Chat subscription lagged");
                    self.resync().await?;
                }
                Err(SubscriptionError::Closed) => return Ok(None),
            }
        }
    }

    /// Send the input as a new message
    ///
    /// Blank input makes no remote call and leaves `input` untouched. The
    /// input is cleared only once the insert succeeds.
    pub async fn send(
        &mut self,
        session: Option<&AuthUser>,
        input: &mut String,
    ) -> Result<ChatMessage, ChatError> {
        let user = session.ok_or(ChatError::LoginRequired(LOGIN_TO_SEND))?;
        let new = compose_message(user, input)?;

        let stored = self.service.send_message(new).await.map_err(|e| {
            tracing::error!(error = %e, user_id = %user.id, "Error sending message");
            ChatError::from(e)
        })?;

        input.clear();
        if self.is_open() {
            self.room.insert(stored.clone());
        }
        Ok(stored)
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, PanelState::Open { .. })
    }

    /// Messages shown, oldest first
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.room.snapshot()
    }

    pub fn room(&self) -> &ChatRoom {
        &self.room
    }

    /// A read-only view of this panel's room
    pub fn preview(&self) -> ChatPreview {
        self.room.preview()
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    fn apply(&self, record: Row) {
        if let Row::ChatMessage(message) = record {
            self.room.insert(message);
        }
    }

    async fn resync(&mut self) -> Result<(), ChatError> {
        let history = self
            .service
            .recent_messages(self.history_limit)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Error resyncing messages");
                ChatError::from(e)
            })?;
        let added = self.room.merge(history);
        tracing::debug!(added, "Chat resynced");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::CountingService;
    use crate::store::{
        Article, DataStore, FeedTopic, NewArticle, StoreConfig, StoreError, StoreResult,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn session() -> AuthUser {
        AuthUser::new("u1", "asha@example.com").full_name("Asha")
    }

    fn panel() -> (ChatPanel<CountingService>, Arc<CountingService>) {
        let service = Arc::new(CountingService::new());
        (ChatPanel::new(Arc::clone(&service)), service)
    }

    fn seed(store: &DataStore, n: usize) {
        for i in 0..n {
            store
                .insert_message(&NewChatMessage {
                    user_id: "u2".to_string(),
                    user_name: "Ravi".to_string(),
                    message: format!("message {}", i),
                })
                .unwrap();
        }
    }

    fn assert_ordered(messages: &[ChatMessage]) {
        assert!(messages.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }

    #[tokio::test]
    async fn test_open_requires_session() {
        let (mut panel, service) = panel();
        assert!(matches!(
            panel.open(None).await,
            Err(ChatError::LoginRequired(_))
        ));
        assert!(!panel.is_open());
        assert_eq!(service.calls(), 0);
        assert_eq!(service.store.realtime().active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_open_loads_most_recent_history() {
        let (mut panel, service) = panel();
        seed(&service.store, 120);

        panel.open(Some(&session())).await.unwrap();

        let messages = panel.messages();
        assert_eq!(messages.len(), 100);
        assert_ordered(&messages);
        assert_eq!(messages.last().unwrap().message, "message 119");
        assert_eq!(messages.first().unwrap().message, "message 20");
    }

    #[tokio::test]
    async fn test_open_close_cycles_keep_one_subscription() {
        let (mut panel, service) = panel();
        let user = session();

        for _ in 0..3 {
            panel.open(Some(&user)).await.unwrap();
            panel.open(Some(&user)).await.unwrap();
            assert_eq!(service.store.realtime().active_subscriptions(), 1);

            panel.close();
            assert_eq!(service.store.realtime().active_subscriptions(), 0);
        }

        panel.open(Some(&user)).await.unwrap();
        assert_eq!(service.store.realtime().active_subscriptions(), 1);
    }

    #[tokio::test]
    async fn test_close_clears_data() {
        let (mut panel, service) = panel();
        seed(&service.store, 3);

        panel.open(Some(&session())).await.unwrap();
        assert_eq!(panel.messages().len(), 3);

        panel.close();
        assert!(!panel.is_open());
        assert!(panel.messages().is_empty());
    }

    #[tokio::test]
    async fn test_drop_releases_subscription() {
        let (mut panel, service) = panel();
        panel.open(Some(&session())).await.unwrap();
        assert_eq!(service.store.realtime().active_subscriptions(), 1);

        drop(panel);
        assert_eq!(service.store.realtime().active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_failed_fetch_stays_closed() {
        let (mut panel, service) = panel();
        service.set_failing(true);

        assert!(matches!(
            panel.open(Some(&session())).await,
            Err(ChatError::Store(_))
        ));
        assert!(!panel.is_open());
        assert_eq!(service.store.realtime().active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_blank_send_makes_no_call() {
        let (mut panel, service) = panel();
        let mut input = "   \n\t".to_string();

        let err = panel.send(Some(&session()), &mut input).await.unwrap_err();

        assert!(matches!(err, ChatError::EmptyMessage));
        assert_eq!(service.calls(), 0);
        assert_eq!(input, "   \n\t");
    }

    #[tokio::test]
    async fn test_send_requires_session() {
        let (mut panel, service) = panel();
        let mut input = "hello".to_string();

        let err = panel.send(None, &mut input).await.unwrap_err();
        assert_eq!(err.to_string(), "Please login to send messages");
        assert_eq!(service.calls(), 0);
        assert_eq!(input, "hello");
    }

    #[tokio::test]
    async fn test_send_clears_input_and_ignores_echo() {
        let (mut panel, _service) = panel();
        let user = session();
        panel.open(Some(&user)).await.unwrap();

        let mut input = "  Namaste sharks  ".to_string();
        let sent = panel.send(Some(&user), &mut input).await.unwrap();

        assert!(input.is_empty());
        assert_eq!(sent.message, "Namaste sharks");
        assert_eq!(sent.user_id, "u1");
        assert_eq!(sent.user_name, "Asha");

        // The live channel echoes our own insert
        assert_eq!(panel.pump().await.unwrap(), 0);
        assert_eq!(panel.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_send_failure_keeps_input() {
        let (mut panel, service) = panel();
        let user = session();
        panel.open(Some(&user)).await.unwrap();
        service.set_failing(true);

        let mut input = "hello".to_string();
        assert!(panel.send(Some(&user), &mut input).await.is_err());
        assert_eq!(input, "hello");
        assert!(panel.messages().is_empty());
    }

    #[tokio::test]
    async fn test_live_inserts_reach_panel_and_preview() {
        let (mut panel, service) = panel();
        panel.open(Some(&session())).await.unwrap();
        let preview = panel.preview();

        seed(&service.store, 2);
        let next = panel.next_message().await.unwrap().unwrap();
        assert_eq!(next.message, "message 0");
        assert_eq!(panel.pump().await.unwrap(), 1);

        assert_eq!(preview.len(), 2);
        assert_ordered(&panel.messages());
    }

    #[tokio::test]
    async fn test_lag_triggers_resync() {
        let mut config = StoreConfig::in_memory();
        config.channel_capacity = 2;
        let store = Arc::new(DataStore::open(config).unwrap());
        let mut panel = ChatPanel::new(Arc::clone(&store));
        panel.open(Some(&session())).await.unwrap();

        seed(&store, 5);
        assert_eq!(panel.pump().await.unwrap(), 5);

        let messages = panel.messages();
        assert_eq!(messages.len(), 5);
        assert_ordered(&messages);
    }

    #[test]
    fn test_compose_message_stamps_identity() {
        let new = compose_message(&session(), "  namaste  ").unwrap();
        assert_eq!(new.user_id, "u1");
        assert_eq!(new.user_name, "Asha");
        assert_eq!(new.message, "namaste");

        assert!(matches!(
            compose_message(&session(), " \n\t "),
            Err(ChatError::EmptyMessage)
        ));
    }

    /// Overruns the channel during the first history fetch, fails every later one
    struct FailingResync {
        store: DataStore,
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl DataService for FailingResync {
        async fn list_topics(&self) -> StoreResult<Vec<FeedTopic>> {
            self.store.list_topics(true)
        }

        async fn list_articles(&self) -> StoreResult<Vec<Article>> {
            self.store.list_articles()
        }

        async fn create_article(&self, new: NewArticle) -> StoreResult<Article> {
            self.store.insert_article(&new)
        }

        async fn recent_messages(&self, limit: usize) -> StoreResult<Vec<ChatMessage>> {
            let fetch = self.fetches.fetch_add(1, Ordering::SeqCst);
            if fetch > 0 {
                return Err(StoreError::Database("connection reset".to_string()));
            }
            let history = self.store.recent_messages(limit)?;
            seed(&self.store, 5);
            Ok(history)
        }

        async fn send_message(&self, new: NewChatMessage) -> StoreResult<ChatMessage> {
            self.store.insert_message(&new)
        }

        fn subscribe(&self, table: Table) -> Subscription {
            self.store.subscribe(table)
        }
    }

    #[tokio::test]
    async fn test_failed_resync_leaves_panel_closed() {
        let mut config = StoreConfig::in_memory();
        config.channel_capacity = 2;
        let service = Arc::new(FailingResync {
            store: DataStore::open(config).unwrap(),
            fetches: AtomicUsize::new(0),
        });
        let mut panel = ChatPanel::new(Arc::clone(&service));

        let result = panel.open(Some(&session())).await;
        assert!(matches!(result, Err(ChatError::Store(_))));
        assert_eq!(service.fetches.load(Ordering::SeqCst), 2);

        assert!(!panel.is_open());
        assert!(panel.messages().is_empty());
        assert_eq!(service.store.realtime().active_subscriptions(), 0);
        assert!(panel.next_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_next_message_on_closed_panel() {
        let (mut panel, _service) = panel();
        assert!(panel.next_message().await.unwrap().is_none());
    }
}
