//! Remote data service
//!
//! [`ApiClient`] implements [`DataService`] over the REST API, so the feed
//! controller and chat panel run against a remote server the same way they
//! run against a local [`DataStore`](crate::store::DataStore).
//!
//! Live updates are polled. Subscribing to a table starts one background
//! task per table that refetches on an interval and publishes rows it has
//! not seen into a local [`Realtime`]. The task exits once the table has no
//! subscribers left.
//!
//! ```no_run
//! use safar::chat::ChatPanel;
//! use safar::client::ApiClient;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(ApiClient::new("http://localhost:8082", Some("token".into())));
//! let session = client.session().await?;
//!
//! let mut chat = ChatPanel::new(Arc::clone(&client));
//! chat.open(session.as_ref()).await?;
//! while let Some(message) = chat.next_message().await? {
//!     println!("{}: {}", message.user_name, message.message);
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use crate::api::dto::{
    ArticleListResponse, MessageListResponse, SendMessageRequest, TopicListResponse,
};
use crate::auth::AuthUser;
use crate::chat::DEFAULT_HISTORY_LIMIT;
use crate::feed::ArticleDraft;
use crate::service::DataService;
use crate::store::{
    Article, ArticleLink, ChatMessage, FeedTopic, NewArticle, NewChatMessage, Realtime, Row,
    RowEvent, StoreError, StoreResult, Subscription, Table,
};

/// Default refetch interval for live subscriptions
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

const POLL_CHANNEL_CAPACITY: usize = 256;

/// Authenticated JSON requests against one server
#[derive(Clone)]
struct Http {
    client: reqwest::Client,
    /// Server root, no trailing slash
    root: String,
    token: Option<String>,
}

impl Http {
    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.root, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: String) -> StoreResult<T> {
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| StoreError::Unreachable(e.to_string()))?;
        read(response).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: String,
        body: &B,
    ) -> StoreResult<T> {
        let response = self
            .authorize(self.client.post(url).json(body))
            .send()
            .await
            .map_err(|e| StoreError::Unreachable(e.to_string()))?;
        read(response).await
    }

    async fn list_topics(&self) -> StoreResult<Vec<FeedTopic>> {
        let page: TopicListResponse = self.get(self.url("/topics")).await?;
        Ok(page.topics)
    }

    async fn list_articles(&self) -> StoreResult<Vec<Article>> {
        let page: ArticleListResponse = self.get(self.url("/articles")).await?;
        Ok(page.articles)
    }

    async fn recent_messages(&self, limit: usize) -> StoreResult<Vec<ChatMessage>> {
        let url = self.url(&format!("/chat/messages?limit={}", limit));
        let page: MessageListResponse = self.get(url).await?;
        Ok(page.messages)
    }
}

/// Decode a success body, or turn the API's error envelope into [`StoreError::Remote`]
async fn read<T: DeserializeOwned>(response: reqwest::Response) -> StoreResult<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| StoreError::InvalidRecord(e.to_string()));
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|body| body["error"]["message"].as_str().map(str::to_string))
        .unwrap_or(text);

    Err(StoreError::Remote {
        status: status.as_u16(),
        message,
    })
}

/// The server stamps authorship and mints internal links, so only the form fields travel
fn draft_for(new: &NewArticle) -> ArticleDraft {
    let description = new.description.clone().unwrap_or_default();
    match &new.link {
        ArticleLink::External(url) => {
            ArticleDraft::link(new.title.clone(), url.clone()).summary(description)
        }
        ArticleLink::Internal(_) => ArticleDraft::write(new.title.clone(), description),
    }
}

/// [`DataService`] backed by a remote Safar server
pub struct ApiClient {
    http: Http,
    poll_interval: Duration,
    history_limit: usize,
    realtime: Arc<Realtime>,
    pollers: Arc<Mutex<HashSet<Table>>>,
}

impl ApiClient {
    /// `url` is the server root, e.g. `http://localhost:8082`
    pub fn new(url: &str, token: Option<String>) -> Self {
        Self {
            http: Http {
                client: reqwest::Client::new(),
                root: url.trim_end_matches('/').to_string(),
                token,
            },
            poll_interval: DEFAULT_POLL_INTERVAL,
            history_limit: DEFAULT_HISTORY_LIMIT,
            realtime: Arc::new(Realtime::new(POLL_CHANNEL_CAPACITY)),
            pollers: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Builder method: set the live refetch interval
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(10));
        self
    }

    /// Builder method: how many recent chat messages each poll covers
    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    pub fn has_token(&self) -> bool {
        self.http.token.is_some()
    }

    /// The signed-in user, or `None` when no token is configured
    pub async fn session(&self) -> StoreResult<Option<AuthUser>> {
        if !self.has_token() {
            return Ok(None);
        }
        self.http.get(self.http.url("/auth/me")).await.map(Some)
    }

    /// GET an `/api/v1` path
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> StoreResult<T> {
        self.http.get(self.http.url(path)).await
    }

    /// GET `/health`
    pub async fn health<T: DeserializeOwned>(&self) -> StoreResult<T> {
        self.http.get(format!("{}/health", self.http.root)).await
    }

    /// Local fan-out the pollers publish into
    pub fn realtime(&self) -> &Realtime {
        &self.realtime
    }

    /// Whether a background poll is running for `table`
    pub fn is_polling(&self, table: Table) -> bool {
        self.pollers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&table)
    }

    fn start_poller(&self, table: Table) {
        let mut pollers = self.pollers.lock().unwrap_or_else(PoisonError::into_inner);
        if pollers.contains(&table) {
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(channel = %table, "No async runtime, live updates disabled");
            return;
        };
        pollers.insert(table);

        let poller = Poller {
            http: self.http.clone(),
            table,
            interval: self.poll_interval,
            history_limit: self.history_limit,
            realtime: Arc::clone(&self.realtime),
            pollers: Arc::clone(&self.pollers),
        };
        runtime.spawn(poller.run());
    }
}

#[async_trait]
impl DataService for ApiClient {
    async fn list_topics(&self) -> StoreResult<Vec<FeedTopic>> {
        self.http.list_topics().await
    }

    async fn list_articles(&self) -> StoreResult<Vec<Article>> {
        self.http.list_articles().await
    }

    async fn create_article(&self, new: NewArticle) -> StoreResult<Article> {
        self.http
            .post(self.http.url("/articles"), &draft_for(&new))
            .await
    }

    async fn recent_messages(&self, limit: usize) -> StoreResult<Vec<ChatMessage>> {
        self.http.recent_messages(limit).await
    }

    async fn send_message(&self, new: NewChatMessage) -> StoreResult<ChatMessage> {
        let body = SendMessageRequest {
            message: new.message,
        };
        self.http.post(self.http.url("/chat/messages"), &body).await
    }

    /// Must be called inside a Tokio runtime for updates to arrive
    fn subscribe(&self, table: Table) -> Subscription {
        let subscription = self.realtime.subscribe(table);
        self.start_poller(table);
        subscription
    }
}

/// Background refetch for one table
struct Poller {
    http: Http,
    table: Table,
    interval: Duration,
    history_limit: usize,
    realtime: Arc<Realtime>,
    pollers: Arc<Mutex<HashSet<Table>>>,
}

impl Poller {
    async fn run(self) {
        tracing::debug!(channel = %self.table, interval = ?self.interval, "Polling started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Ids returned by the previous fetch
        let mut seen: HashSet<String> = HashSet::new();

        loop {
            ticker.tick().await;
            if self.idle() {
                break;
            }

            match self.fetch().await {
                Ok(rows) => {
                    let mut latest = HashSet::with_capacity(rows.len());
                    for (id, row) in rows {
                        if !seen.contains(&id) {
                            self.realtime.publish(RowEvent::insert(row));
                        }
                        latest.insert(id);
                    }
                    seen = latest;
                }
                Err(e) => tracing::warn!(channel = %self.table, error = %e, "Poll failed"),
            }
        }

        tracing::debug!(channel = %self.table, "Polling stopped");
    }

    /// Deregister when nobody is listening
    ///
    /// Checked under the registry lock so a concurrent subscribe either sees
    /// this poller still registered or starts a new one.
    fn idle(&self) -> bool {
        let mut pollers = self.pollers.lock().unwrap_or_else(PoisonError::into_inner);
        if self.realtime.subscriber_count(self.table) > 0 {
            return false;
        }
        pollers.remove(&self.table);
        true
    }

    /// Current rows, oldest first
    async fn fetch(&self) -> StoreResult<Vec<(String, Row)>> {
        let rows = match self.table {
            Table::ChatMessages => self
                .http
                .recent_messages(self.history_limit)
                .await?
                .into_iter()
                .map(|m| (m.id.clone(), Row::ChatMessage(m)))
                .collect(),
            Table::Articles => self
                .http
                .list_articles()
                .await?
                .into_iter()
                .rev()
                .map(|a| (a.id.clone(), Row::Article(a)))
                .collect(),
            Table::FeedTopics => self
                .http
                .list_topics()
                .await?
                .into_iter()
                .map(|t| (t.id.clone(), Row::FeedTopic(t)))
                .collect(),
        };
        Ok(rows)
    }
}
