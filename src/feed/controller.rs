//! Feed view model
//!
//! Holds the topics and articles shown on the feed page. Local state only
//! changes after the data service acknowledges a call.

use serde::Serialize;
use std::sync::Arc;

use super::draft::ArticleDraft;
use super::FeedError;
use crate::auth::AuthUser;
use crate::service::DataService;
use crate::store::{Article, ArticleContent, FeedTopic};

const LOGIN_TO_ADD: &str = "Please login to add articles";
const LOGIN_TO_READ: &str = "Please login to read this article";

/// What the reader should see after clicking an article
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ArticleAction {
    /// Open the URL in a new browsing context
    OpenExternal { url: String },
    /// Show the internal article's body inline
    Expanded { body: String },
    /// The internal article was already expanded and is now folded
    Collapsed,
}

/// Feed page state
pub struct FeedController<S: DataService + ?Sized> {
    service: Arc<S>,
    topics: Vec<FeedTopic>,
    articles: Vec<Article>,
    selected_topic: Option<String>,
    expanded_article: Option<String>,
}

impl<S: DataService + ?Sized> FeedController<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self {
            service,
            topics: Vec::new(),
            articles: Vec::new(),
            selected_topic: None,
            expanded_article: None,
        }
    }

    /// Fetch topics and articles
    ///
    /// Each list is fetched independently; a failure keeps that list as it
    /// was and is returned after both fetches ran.
    pub async fn load(&mut self) -> Result<(), FeedError> {
        let mut first_error = None;

        match self.service.list_topics().await {
            Ok(topics) => self.topics = topics,
            Err(e) => {
                tracing::error!(error = %e, "Error fetching topics");
                first_error.get_or_insert(e);
            }
        }

        match self.service.list_articles().await {
            Ok(articles) => self.articles = articles,
            Err(e) => {
                tracing::error!(error = %e, "Error fetching articles");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => {
                tracing::debug!(
                    topics = self.topics.len(),
                    articles = self.articles.len(),
                    "Feed loaded"
                );
                Ok(())
            }
        }
    }

    /// Publish the draft
    ///
    /// Rejected locally (no remote call) without a session or with missing
    /// fields. On success the stored article becomes the first entry and the
    /// draft is cleared; on failure nothing local changes.
    pub async fn submit(
        &mut self,
        session: Option<&AuthUser>,
        draft: &mut ArticleDraft,
    ) -> Result<&Article, FeedError> {
        let author = session.ok_or(FeedError::LoginRequired(LOGIN_TO_ADD))?;
        let new = draft.to_new_article(author)?;

        let article = self.service.create_article(new).await.map_err(|e| {
            tracing::error!(error = %e, author_id = %author.id, "Error adding article");
            FeedError::from(e)
        })?;

        self.articles.insert(0, article);
        draft.clear();
        Ok(&self.articles[0])
    }

    /// Handle a click on an article
    pub fn open_article(
        &mut self,
        session: Option<&AuthUser>,
        id: &str,
    ) -> Result<ArticleAction, FeedError> {
        if session.is_none() {
            return Err(FeedError::LoginRequired(LOGIN_TO_READ));
        }

        let article = self
            .articles
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| FeedError::NotFound(id.to_string()))?;

        match article.content() {
            ArticleContent::External { url } => Ok(ArticleAction::OpenExternal { url }),
            ArticleContent::Internal { body, .. } => {
                if self.expanded_article.as_deref() == Some(id) {
                    self.expanded_article = None;
                    Ok(ArticleAction::Collapsed)
                } else {
                    self.expanded_article = Some(id.to_string());
                    Ok(ArticleAction::Expanded { body })
                }
            }
        }
    }

    /// Select a topic, or clear the selection if it is already selected
    pub fn toggle_topic(&mut self, id: &str) -> Option<&str> {
        if self.selected_topic.as_deref() == Some(id) {
            self.selected_topic = None;
        } else {
            self.selected_topic = Some(id.to_string());
        }
        self.selected_topic.as_deref()
    }

    pub fn topics(&self) -> &[FeedTopic] {
        &self.topics
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn selected_topic(&self) -> Option<&str> {
        self.selected_topic.as_deref()
    }

    pub fn expanded_article(&self) -> Option<&str> {
        self.expanded_article.as_deref()
    }
}
